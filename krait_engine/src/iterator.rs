//! The engine-level implementation of ECMAScript's `IteratorRecord`.
//!
//! More information:
//!  - [ECMA reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-iterator-records

use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    context::{Context, Signal},
    error::{EvalResult, JsNativeError},
    function::{NativeFunction, NativeFunctionData},
    object::JsObject,
    property::{Attribute, PropertyDescriptor, PropertyKey},
    string::JsString,
    symbol::JsSymbol,
    value::JsValue,
};

/// Iterator hint for [`get_iterator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorHint {
    /// Hints that the iterator should be sync.
    Sync,

    /// Hints that the iterator should be async.
    Async,
}

/// `CreateIterResultObject( value, done )`
///
/// Generates an object supporting the `IteratorResult` interface.
///
/// More information:
///  - [ECMA reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-createiterresultobject
#[must_use]
pub fn create_iter_result_object(value: JsValue, done: bool, context: &Context) -> JsValue {
    // 1. Let obj be OrdinaryObjectCreate(%Object.prototype%).
    let obj = JsObject::new_ordinary(Some(context.realm().intrinsics().object_prototype()));

    // 2. Perform ! CreateDataPropertyOrThrow(obj, "value", value).
    obj.insert_property(
        "value",
        PropertyDescriptor::data(value, Attribute::all_attrs()),
    );

    // 3. Perform ! CreateDataPropertyOrThrow(obj, "done", done).
    obj.insert_property(
        "done",
        PropertyDescriptor::data(JsValue::Boolean(done), Attribute::all_attrs()),
    );

    // 4. Return obj.
    obj.into()
}

/// Iterator Record
///
/// An Iterator Record encapsulates an iterator object along with its `next`
/// method.
#[derive(Clone, Debug)]
pub struct IteratorRecord {
    /// `[[Iterator]]`
    iterator: JsObject,

    /// `[[NextMethod]]`
    next_method: JsValue,

    /// `[[Done]]`
    done: bool,
}

impl IteratorRecord {
    /// Creates a new `IteratorRecord`.
    #[must_use]
    pub fn new(iterator: JsObject, next_method: JsValue) -> Self {
        Self {
            iterator,
            next_method,
            done: false,
        }
    }

    /// Gets the `[[Iterator]]` field.
    #[must_use]
    pub const fn iterator(&self) -> &JsObject {
        &self.iterator
    }

    /// Gets the `[[Done]]` field.
    #[must_use]
    pub const fn done(&self) -> bool {
        self.done
    }

    /// `IteratorNext ( iteratorRecord [ , value ] )` followed by
    /// `IteratorComplete`/`IteratorValue`: pulls one result. Returns
    /// `Ok(None)` on exhaustion or when a throw signal surfaced.
    ///
    /// More information:
    ///  - [ECMA reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-iteratornext
    pub fn step_with(
        &mut self,
        value: Option<&JsValue>,
        context: &mut Context,
    ) -> EvalResult<Option<JsValue>> {
        context.check_cancelled()?;

        // 1. Let result be ? Call(iteratorRecord.[[NextMethod]], iteratorRecord.[[Iterator]], « value »).
        let this = JsValue::from(self.iterator.clone());
        let args: Vec<JsValue> = value.cloned().into_iter().collect();
        let result = crate::eval::call::call_value(&self.next_method, &this, &args, context)?;
        if context.should_stop() {
            self.done = true;
            return Ok(None);
        }

        // 2. If Type(result) is not Object, throw a TypeError exception.
        let Some(result) = result.as_object().cloned() else {
            self.done = true;
            context.throw(
                JsNativeError::typ().with_message("iterator result is not an object"),
            )?;
            return Ok(None);
        };

        // 3. Let done be ? IteratorComplete(result).
        let done = result.get("done", context)?.to_boolean();
        if context.should_stop() {
            self.done = true;
            return Ok(None);
        }
        if done {
            self.done = true;
            return Ok(None);
        }

        // 4. Return ? IteratorValue(result).
        let value = result.get("value", context)?;
        if context.should_stop() {
            self.done = true;
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// `IteratorStep ( iteratorRecord )`
    pub fn step(&mut self, context: &mut Context) -> EvalResult<Option<JsValue>> {
        self.step_with(None, context)
    }

    /// Pulls one raw result object without unwrapping `done`/`value`; the
    /// async driver awaits it first.
    pub fn step_raw(
        &mut self,
        value: Option<&JsValue>,
        context: &mut Context,
    ) -> EvalResult<JsValue> {
        context.check_cancelled()?;
        let this = JsValue::from(self.iterator.clone());
        let args: Vec<JsValue> = value.cloned().into_iter().collect();
        crate::eval::call::call_value(&self.next_method, &this, &args, context)
    }

    /// `IteratorClose ( iteratorRecord, completion )`
    ///
    /// Notifies the iterator that the consumer is done with it. The signal
    /// in flight (if any) is preserved: a secondary throw raised by the
    /// `return` method is suppressed when a throw is already propagating.
    ///
    /// More information:
    ///  - [ECMA reference][spec]
    ///
    ///  [spec]: https://tc39.es/ecma262/#sec-iteratorclose
    pub fn close(&self, context: &mut Context) -> EvalResult<()> {
        // The completion in flight. Restored (or superseded) below.
        let completion = context.take_signal();
        let throwing = matches!(completion, Signal::Throw(_));

        // 3. Let innerResult be Completion(GetMethod(iterator, "return")).
        let return_method = self.iterator.get_method("return", context)?;
        if context.should_stop() {
            // 5. If completion.[[Type]] is throw, return ? completion.
            if throwing {
                context.set_signal(completion);
            }
            return Ok(());
        }

        let Some(return_method) = return_method else {
            // 4.b. If return is undefined, return ? completion.
            context.set_signal(completion);
            return Ok(());
        };

        // 4.c. Set innerResult to Completion(Call(return, iterator)).
        let inner_result = crate::eval::call::call_function(
            &return_method,
            &JsValue::from(self.iterator.clone()),
            &[],
            context,
        )?;

        if context.should_stop() {
            // 6. If innerResult.[[Type]] is throw and the original
            // completion was a throw too, the original wins.
            if throwing {
                context.set_signal(completion);
            }
            return Ok(());
        }

        // 7. If Type(innerResult.[[Value]]) is not Object, throw a TypeError.
        if !throwing && !inner_result.is_object() {
            context.throw(
                JsNativeError::typ().with_message("inner result was not an object"),
            )?;
            return Ok(());
        }

        // 8. Return ? completion.
        context.set_signal(completion);
        Ok(())
    }
}

/// `GetIterator ( obj [ , hint ] )`
///
/// Resolves the iterator protocol for a value, with the engine-native
/// fallbacks for strings and for iterator-shaped objects whose `@@iterator`
/// lookup failed. Returns `Ok(None)` when a throw signal surfaced.
///
/// More information:
///  - [ECMA reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-getiterator
pub fn get_iterator(
    value: &JsValue,
    hint: IteratorHint,
    context: &mut Context,
) -> EvalResult<Option<IteratorRecord>> {
    if let Some(object) = value.as_object() {
        // 1. Look up @@asyncIterator (async hint), then @@iterator.
        if hint == IteratorHint::Async {
            let method = object.get_method(JsSymbol::async_iterator(), context)?;
            if context.should_stop() {
                return Ok(None);
            }
            if let Some(method) = method {
                return iterator_from_method(value, &method, context);
            }
            // No async iterator: fall through to the sync protocol; the
            // async driver awaits each result.
        }

        let method = object.get_method(JsSymbol::iterator(), context)?;
        if context.should_stop() {
            return Ok(None);
        }
        if let Some(method) = method {
            return iterator_from_method(value, &method, context);
        }

        // 3. `next` without `@@iterator`: treat the value itself as the
        // iterator. Covers iterator objects whose symbol lookup failed.
        let next = object.get("next", context)?;
        if context.should_stop() {
            return Ok(None);
        }
        if next.as_callable().is_some() {
            return Ok(Some(IteratorRecord::new(object.clone(), next)));
        }
    } else if let Some(string) = value.as_string() {
        // 2. Strings iterate code-point-wise.
        return Ok(Some(string_iterator(string, context)));
    }

    context.throw(JsNativeError::typ().with_message("Value is not iterable"))?;
    Ok(None)
}

fn iterator_from_method(
    value: &JsValue,
    method: &JsObject,
    context: &mut Context,
) -> EvalResult<Option<IteratorRecord>> {
    // 3. Let iterator be ? Call(method, obj).
    let iterator = crate::eval::call::call_function(method, value, &[], context)?;
    if context.should_stop() {
        return Ok(None);
    }

    // 4. If Type(iterator) is not Object, throw a TypeError exception.
    let Some(iterator) = iterator.as_object().cloned() else {
        context.throw(
            JsNativeError::typ().with_message("returned iterator is not an object"),
        )?;
        return Ok(None);
    };

    // 5. Let nextMethod be ? GetV(iterator, "next").
    let next_method = iterator.get("next", context)?;
    if context.should_stop() {
        return Ok(None);
    }

    // 6.-7. Return the Iterator Record.
    Ok(Some(IteratorRecord::new(iterator, next_method)))
}

/// Creates an engine-native iterator object from a Rust closure producing
/// `Some(value)` per step and `None` on exhaustion.
pub fn native_iterator<F>(step: F, context: &Context) -> IteratorRecord
where
    F: FnMut() -> Option<JsValue> + 'static,
{
    let state = Rc::new(RefCell::new(step));
    let iterator = JsObject::new_ordinary(Some(context.realm().intrinsics().iterator_prototype()));
    let next = NativeFunction::from_closure(move |_, _, context| {
        let produced = (state.borrow_mut())();
        Ok(match produced {
            Some(value) => create_iter_result_object(value, false, context),
            None => create_iter_result_object(JsValue::Undefined, true, context),
        })
    });
    let next_obj = crate::builtins::new_native_function(
        NativeFunctionData {
            function: next,
            name: "next".into(),
            constructor: false,
            construct_error: None,
        },
        0,
        context.realm().intrinsics().function_prototype(),
    );
    iterator.insert_property(
        "next",
        PropertyDescriptor::data(next_obj.clone().into(), Attribute::WRITABLE | Attribute::CONFIGURABLE),
    );
    IteratorRecord::new(iterator, next_obj.into())
}

/// The code-point-wise fallback iterator for strings.
fn string_iterator(string: &JsString, context: &Context) -> IteratorRecord {
    let chars: Vec<JsValue> = string
        .as_str()
        .chars()
        .map(|c| JsValue::from(JsString::from(c.to_string())))
        .collect();
    let mut position = 0;
    native_iterator(
        move || {
            let produced = chars.get(position).cloned();
            position += 1;
            produced
        },
        context,
    )
}

/// `IterableToList ( items )`
///
/// More information:
///  - [ECMA reference][spec]
///
///  [spec]: https://tc39.es/ecma262/#sec-iterabletolist
pub fn iterable_to_list(items: &JsValue, context: &mut Context) -> EvalResult<Vec<JsValue>> {
    let Some(mut record) = get_iterator(items, IteratorHint::Sync, context)? else {
        return Ok(Vec::new());
    };

    let mut values = Vec::new();
    while let Some(value) = record.step(context)? {
        values.push(value);
    }
    Ok(values)
}

/// The engine-native `for-in` key enumerator: walks the prototype chain,
/// yielding each enumerable string key once, skipping keys shadowed or
/// deleted along the way.
#[derive(Debug)]
pub struct ForInEnumerator {
    object: Option<JsObject>,
    visited: rustc_hash::FxHashSet<JsString>,
    remaining: std::collections::VecDeque<JsString>,
    object_was_visited: bool,
}

impl ForInEnumerator {
    /// Creates an enumerator over the own and inherited keys of a value.
    /// `undefined` and `null` enumerate nothing.
    #[must_use]
    pub fn new(value: &JsValue) -> Self {
        Self {
            object: value.as_object().cloned(),
            visited: rustc_hash::FxHashSet::default(),
            remaining: std::collections::VecDeque::new(),
            object_was_visited: false,
        }
    }

    /// Produces the next key, or `None` when exhausted.
    pub fn step(&mut self) -> Option<JsString> {
        loop {
            let object = self.object.clone()?;
            if !self.object_was_visited {
                for key in object.own_property_keys() {
                    match key {
                        PropertyKey::String(s) => self.remaining.push_back(s),
                        PropertyKey::Index(i) => {
                            self.remaining.push_back(i.to_string().into());
                        }
                        PropertyKey::Symbol(_) => {}
                    }
                }
                self.object_was_visited = true;
            }
            while let Some(key) = self.remaining.pop_front() {
                if self.visited.contains(&key) {
                    continue;
                }
                if let Some(descriptor) = object.get_own_property(&PropertyKey::from_string(&key)) {
                    self.visited.insert(key.clone());
                    if descriptor.expect_enumerable() {
                        return Some(key);
                    }
                }
            }
            self.object = object.prototype();
            self.object_was_visited = false;
        }
    }
}
