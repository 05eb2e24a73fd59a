//! The realm: the shared root state of every context spawned within it.
//!
//! A realm owns the prototype chain roots, the standard constructors, the
//! global object and global environment, the well-known symbol identities,
//! the set of restricted global names, and the promise job queue.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-code-realms

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::{
    environments::{DeclarativeEnvironment, Environment},
    job::NativeJob,
    object::JsObject,
    string::JsString,
    symbol::WellKnownSymbols,
};

/// A standard constructor record: the constructor function object and its
/// `prototype` object.
#[derive(Clone, Debug)]
pub struct StandardConstructor {
    constructor: JsObject,
    prototype: JsObject,
}

impl StandardConstructor {
    /// Creates a record from its two objects.
    #[must_use]
    pub fn new(constructor: JsObject, prototype: JsObject) -> Self {
        Self {
            constructor,
            prototype,
        }
    }

    /// Gets the constructor object.
    #[must_use]
    pub fn constructor(&self) -> JsObject {
        self.constructor.clone()
    }

    /// Gets the prototype object.
    #[must_use]
    pub fn prototype(&self) -> JsObject {
        self.prototype.clone()
    }
}

/// The intrinsic objects of a realm.
#[derive(Clone, Debug)]
pub struct Intrinsics {
    pub(crate) object_prototype: JsObject,
    pub(crate) function_prototype: JsObject,
    pub(crate) array_prototype: JsObject,
    pub(crate) iterator_prototype: JsObject,
    pub(crate) async_iterator_prototype: JsObject,
    pub(crate) generator_prototype: JsObject,
    pub(crate) async_generator_prototype: JsObject,
    pub(crate) error: StandardConstructor,
    pub(crate) type_error: StandardConstructor,
    pub(crate) range_error: StandardConstructor,
    pub(crate) reference_error: StandardConstructor,
    pub(crate) syntax_error: StandardConstructor,
    pub(crate) promise: StandardConstructor,
    pub(crate) symbol_namespace: JsObject,
}

impl Intrinsics {
    /// `%Object.prototype%`
    #[must_use]
    pub fn object_prototype(&self) -> JsObject {
        self.object_prototype.clone()
    }

    /// `%Function.prototype%`
    #[must_use]
    pub fn function_prototype(&self) -> JsObject {
        self.function_prototype.clone()
    }

    /// `%Array.prototype%`
    #[must_use]
    pub fn array_prototype(&self) -> JsObject {
        self.array_prototype.clone()
    }

    /// `%IteratorPrototype%`
    #[must_use]
    pub fn iterator_prototype(&self) -> JsObject {
        self.iterator_prototype.clone()
    }

    /// `%AsyncIteratorPrototype%`
    #[must_use]
    pub fn async_iterator_prototype(&self) -> JsObject {
        self.async_iterator_prototype.clone()
    }

    /// `%GeneratorPrototype%`
    #[must_use]
    pub fn generator_prototype(&self) -> JsObject {
        self.generator_prototype.clone()
    }

    /// `%AsyncGeneratorPrototype%`
    #[must_use]
    pub fn async_generator_prototype(&self) -> JsObject {
        self.async_generator_prototype.clone()
    }

    /// The `Error` constructor record.
    #[must_use]
    pub fn error(&self) -> &StandardConstructor {
        &self.error
    }

    /// The `TypeError` constructor record.
    #[must_use]
    pub fn type_error(&self) -> &StandardConstructor {
        &self.type_error
    }

    /// The `RangeError` constructor record.
    #[must_use]
    pub fn range_error(&self) -> &StandardConstructor {
        &self.range_error
    }

    /// The `ReferenceError` constructor record.
    #[must_use]
    pub fn reference_error(&self) -> &StandardConstructor {
        &self.reference_error
    }

    /// The `SyntaxError` constructor record.
    #[must_use]
    pub fn syntax_error(&self) -> &StandardConstructor {
        &self.syntax_error
    }

    /// The `Promise` constructor record.
    #[must_use]
    pub fn promise(&self) -> &StandardConstructor {
        &self.promise
    }

    /// The `Symbol` namespace object, whose well-known properties the
    /// member-access hot path short-circuits.
    #[must_use]
    pub fn symbol_namespace(&self) -> JsObject {
        self.symbol_namespace.clone()
    }
}

#[derive(Debug)]
struct RealmInner {
    intrinsics: Intrinsics,
    global_object: JsObject,
    global_environment: Environment,
    well_known: WellKnownSymbols,
    restricted_globals: FxHashSet<JsString>,
    annex_b: bool,
    jobs: RefCell<VecDeque<NativeJob>>,
}

/// A shared handle on a realm.
#[derive(Clone, Debug)]
pub struct Realm {
    inner: Rc<RealmInner>,
}

impl Realm {
    /// Creates a fresh realm with its intrinsics and global scope.
    #[must_use]
    pub fn create(annex_b: bool) -> Self {
        let well_known = WellKnownSymbols::get();
        let (intrinsics, global_object, restricted_globals) =
            crate::builtins::create_intrinsics(&well_known);
        let global_environment = DeclarativeEnvironment::new_global(global_object.clone());
        Self {
            inner: Rc::new(RealmInner {
                intrinsics,
                global_object,
                global_environment,
                well_known,
                restricted_globals,
                annex_b,
                jobs: RefCell::default(),
            }),
        }
    }

    /// Gets the intrinsics of the realm.
    #[must_use]
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.inner.intrinsics
    }

    /// Gets the global object.
    #[must_use]
    pub fn global_object(&self) -> JsObject {
        self.inner.global_object.clone()
    }

    /// Gets the global environment record.
    #[must_use]
    pub fn global_environment(&self) -> Environment {
        self.inner.global_environment.clone()
    }

    /// Gets the well-known symbol identities of the realm.
    #[must_use]
    pub fn well_known(&self) -> &WellKnownSymbols {
        &self.inner.well_known
    }

    /// Returns `true` if the name is a restricted global that lexical
    /// declarations may not shadow.
    #[must_use]
    pub fn is_restricted_global(&self, name: &JsString) -> bool {
        self.inner.restricted_globals.contains(name)
    }

    /// Returns `true` if sloppy-mode Annex-B semantics are enabled.
    #[must_use]
    pub fn annex_b(&self) -> bool {
        self.inner.annex_b
    }

    /// Returns `true` if both handles refer to the same realm.
    #[must_use]
    pub fn ptr_eq(lhs: &Self, rhs: &Self) -> bool {
        Rc::ptr_eq(&lhs.inner, &rhs.inner)
    }

    /// Enqueues a promise job.
    pub fn enqueue_job(&self, job: NativeJob) {
        self.inner.jobs.borrow_mut().push_back(job);
    }

    /// Pops the next pending job, FIFO.
    #[must_use]
    pub fn pop_job(&self) -> Option<NativeJob> {
        self.inner.jobs.borrow_mut().pop_front()
    }

    /// Returns `true` while jobs are pending.
    #[must_use]
    pub fn has_pending_jobs(&self) -> bool {
        !self.inner.jobs.borrow().is_empty()
    }
}
