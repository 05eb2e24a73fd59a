//! Private names and private environments.
//!
//! Every class evaluation with `#` members allocates a private environment:
//! a realm-local scope mapping the source-level private names to unique
//! name tokens. Objects carry the elements keyed by token; holding an
//! element of a class's environment is what brands an object as an
//! instance of that class.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-privateenvironment-records

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::object::JsObject;
use crate::value::JsValue;

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// A resolved private name: the description plus a unique token.
#[derive(Clone, Debug)]
pub struct PrivateName {
    description: Rc<str>,
    id: u64,
}

impl PrivateName {
    /// Allocates a fresh private name.
    #[must_use]
    pub fn new(description: Rc<str>) -> Self {
        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Self { description, id }
    }

    /// Gets the source-level description, without the leading `#`.
    #[must_use]
    pub fn description(&self) -> &Rc<str> {
        &self.description
    }

    /// Gets the unique token of the name.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// A private environment record: one lexical level of `#` names.
#[derive(Debug)]
pub struct PrivateEnvironment {
    parent: Option<Rc<PrivateEnvironment>>,
    names: FxHashMap<Rc<str>, PrivateName>,
}

impl PrivateEnvironment {
    /// Creates a private environment declaring the given names.
    #[must_use]
    pub fn new(parent: Option<Rc<Self>>, names: &[Rc<str>]) -> Rc<Self> {
        let mut map = FxHashMap::default();
        for name in names {
            map.insert(name.clone(), PrivateName::new(name.clone()));
        }
        Rc::new(Self { parent, names: map })
    }

    /// Resolves a source-level private name through the scope chain.
    #[must_use]
    pub fn resolve(self: &Rc<Self>, name: &str) -> Option<PrivateName> {
        let mut env = self.clone();
        loop {
            if let Some(found) = env.names.get(name) {
                return Some(found.clone());
            }
            match env.parent.clone() {
                Some(parent) => env = parent,
                None => return None,
            }
        }
    }
}

/// A private element stored on an object.
#[derive(Clone, Debug)]
pub enum PrivateElement {
    /// A private field value.
    Field(JsValue),

    /// A private method.
    Method(JsObject),

    /// A private accessor pair.
    Accessor {
        /// The getter, if any.
        getter: Option<JsObject>,
        /// The setter, if any.
        setter: Option<JsObject>,
    },
}
