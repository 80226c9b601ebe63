use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use crate::modules::ModuleRegistry;
use crate::value::{EvalError, EvalErrorKind};

/// Stop-gap for the missing tail-call elimination: deep recursion is
/// cut off with a fatal error before the host stack gives out.
pub const MAX_CALL_DEPTH: usize = 1000;

/// Everything evaluation needs besides the scope chain: the directory
/// file paths resolve against, the shared module registry and the call
/// depth counter. Passed explicitly, no global state.
#[derive(Clone)]
pub struct Context {
    pub current_dir: PathBuf,
    pub modules: Rc<RefCell<ModuleRegistry>>,
    depth: Rc<Cell<usize>>,
}

impl Context {
    pub fn new(current_dir: PathBuf) -> Self {
        Context {
            current_dir,
            modules: Rc::new(RefCell::new(ModuleRegistry::new())),
            depth: Rc::new(Cell::new(0)),
        }
    }

    /// Same registry and depth counter, different base directory. Used
    /// when descending into an imported file.
    pub fn for_module(&self, current_dir: PathBuf) -> Context {
        Context {
            current_dir,
            modules: self.modules.clone(),
            depth: self.depth.clone(),
        }
    }

    pub fn enter_call(&self) -> Result<(), EvalError> {
        let depth = self.depth.get();
        if depth >= MAX_CALL_DEPTH {
            return Err(EvalError::new(EvalErrorKind::StackExhausted));
        }
        self.depth.set(depth + 1);
        Ok(())
    }

    pub fn exit_call(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}
