//! Request body access shared by operation disambiguation and id extraction.

use std::cell::Cell;

use bytes::Bytes;
use once_cell::unsync::OnceCell;
use serde_json::Value;

use super::ClassificationError;

type Loader<'a> = Box<dyn FnOnce() -> Result<Bytes, ClassificationError> + 'a>;

/// A request body that is read on first use and parsed at most once.
pub struct LazyBody<'a> {
    loader: Cell<Option<Loader<'a>>>,
    raw: OnceCell<Result<Bytes, ClassificationError>>,
    json: OnceCell<Result<Value, String>>,
}

impl<'a> LazyBody<'a> {
    pub fn new(loader: impl FnOnce() -> Bytes + 'a) -> Self {
        Self::try_new(move || Ok(loader()))
    }

    /// Body whose loader may fail, e.g. when the stream exceeds a size limit.
    pub fn try_new(loader: impl FnOnce() -> Result<Bytes, ClassificationError> + 'a) -> Self {
        Self {
            loader: Cell::new(Some(Box::new(loader))),
            raw: OnceCell::new(),
            json: OnceCell::new(),
        }
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::new(move || bytes)
    }

    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// Raw body, invoking the loader on first call.
    ///
    /// A loader failure is remembered and returned on every call.
    pub fn bytes(&self) -> Result<&Bytes, ClassificationError> {
        self.raw
            .get_or_init(|| self.loader.take().map_or_else(|| Ok(Bytes::new()), |load| load()))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Whether the loader has run.
    pub fn is_loaded(&self) -> bool {
        self.raw.get().is_some()
    }

    /// Body decoded as JSON.
    pub fn json(&self) -> Result<&Value, ClassificationError> {
        let raw = self.bytes()?;
        self.json
            .get_or_init(|| serde_json::from_slice(raw).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| {
                ClassificationError::MalformedBody(format!("cannot understand JSON: {}", e))
            })
    }
}

impl std::fmt::Debug for LazyBody<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyBody").field("loaded", &self.is_loaded()).finish()
    }
}

/// Operation named by the single top-level key of a JSON body.
///
/// `{"reboot": {"type": "HARD"}}` yields `reboot`.
pub fn operation_from_body(body: &LazyBody<'_>) -> Result<String, ClassificationError> {
    let value = body.json()?;
    let Some(object) = value.as_object().filter(|object| object.len() == 1) else {
        return Err(ClassificationError::MalformedBody(
            "cannot understand body: expected exactly one top-level key".to_string(),
        ));
    };

    object.keys().next().cloned().ok_or_else(|| {
        ClassificationError::MalformedBody("cannot understand body: no operation".to_string())
    })
}
