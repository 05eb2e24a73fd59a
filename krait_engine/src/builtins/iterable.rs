//! `%IteratorPrototype%` and `%AsyncIteratorPrototype%`.

use crate::{object::JsObject, symbol::WellKnownSymbols};

use super::def_method;

/// Builds the two iterator prototype roots. Each returns `this` from its
/// `@@iterator`/`@@asyncIterator` method, so iterator objects are
/// themselves iterable.
pub(crate) fn init(
    object_prototype: &JsObject,
    function_prototype: &JsObject,
    well_known: &WellKnownSymbols,
) -> (JsObject, JsObject) {
    let iterator_prototype = JsObject::new_ordinary(Some(object_prototype.clone()));
    def_method(
        &iterator_prototype,
        well_known.iterator(),
        "[Symbol.iterator]",
        0,
        function_prototype,
        |this, _, _| Ok(this.clone()),
    );

    let async_iterator_prototype = JsObject::new_ordinary(Some(object_prototype.clone()));
    def_method(
        &async_iterator_prototype,
        well_known.async_iterator(),
        "[Symbol.asyncIterator]",
        0,
        function_prototype,
        |this, _, _| Ok(this.clone()),
    );

    (iterator_prototype, async_iterator_prototype)
}
