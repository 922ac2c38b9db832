use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::runner::ds::env_record::Environment;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::std_lib::register_core_builtins;

/// Built-in prototype objects. Values carry no prototype pointer; property
/// reads fall back to the prototype of their kind, then `object_prototype`.
pub struct Intrinsics {
    pub object_prototype: JsObjectType,
    pub array_prototype: JsObjectType,
    pub string_prototype: JsObjectType,
    pub number_prototype: JsObjectType,
    pub function_prototype: JsObjectType,
    pub error_prototype: JsObjectType,
}
impl Intrinsics {
    fn new() -> Self {
        let empty = || Rc::new(RefCell::new(ObjectType::Ordinary(ObjectBase::new())));
        Intrinsics {
            object_prototype: empty(),
            array_prototype: empty(),
            string_prototype: empty(),
            number_prototype: empty(),
            function_prototype: empty(),
            error_prototype: empty(),
        }
    }

    pub fn prototype_for(&self, o: &ObjectType) -> Option<&JsObjectType> {
        match o {
            ObjectType::Array(_) => Some(&self.array_prototype),
            ObjectType::Function(_) => Some(&self.function_prototype),
            ObjectType::Error(_) => Some(&self.error_prototype),
            ObjectType::Ordinary(_) | ObjectType::Proxy(_) => None,
        }
    }
}

/// Deepest nesting of script function calls a realm allows. Every call
/// nests several interpreter futures on the native stack.
pub const MAX_CALL_DEPTH: usize = 64;

pub struct Realm {
    pub global_env: Environment,
    pub intrinsics: Intrinsics,
    call_depth: Cell<usize>,
}
impl Realm {
    pub fn new() -> Self {
        Realm {
            global_env: Environment::new(None),
            intrinsics: Intrinsics::new(),
            call_depth: Cell::new(0),
        }
    }

    /// Number of script calls currently running in this realm.
    pub fn call_depth(&self) -> usize {
        self.call_depth.get()
    }

    /// Enters a script call. The call ends when the guard is dropped.
    pub fn enter_call(self: &Rc<Self>) -> Result<CallGuard, JErrorType> {
        let depth = self.call_depth.get();
        if depth >= MAX_CALL_DEPTH {
            return Err(JErrorType::RangeError(
                "Maximum call stack size exceeded".to_string(),
            ));
        }
        self.call_depth.set(depth + 1);
        Ok(CallGuard {
            realm: self.clone(),
        })
    }

    /// A realm with the standard library installed.
    pub fn with_core() -> Self {
        let realm = Realm::new();
        register_core_builtins(&realm);
        realm
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CallGuard {
    realm: Rc<Realm>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        let depth = self.realm.call_depth.get();
        self.realm.call_depth.set(depth.saturating_sub(1));
    }
}
