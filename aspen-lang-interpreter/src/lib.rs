pub mod builtins;
pub mod context;
pub mod environment;
pub mod evaluator;
pub mod modules;
pub mod operators;
pub mod value;
