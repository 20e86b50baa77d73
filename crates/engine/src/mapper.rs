use crate::class::{ClassId, ModelClass};
use crate::error::ModelError;
use crate::model::Model;
use crate::value::Value;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Key of a mapping: a free-form name or another model class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapTarget {
    Name(Cow<'static, str>),
    Class(ClassId),
}

impl From<&'static str> for MapTarget {
    fn from(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<String> for MapTarget {
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

impl From<&ModelClass> for MapTarget {
    fn from(class: &ModelClass) -> Self {
        Self::Class(class.id())
    }
}

impl fmt::Display for MapTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Class(id) => write!(f, "{id:?}"),
        }
    }
}

/// Conversion of a model into its target representation.
pub type MapHandler = Arc<dyn Fn(&Model) -> Result<Value, ModelError> + Send + Sync>;

type Mappings = FxHashMap<(ClassId, MapTarget), MapHandler>;

static MAPPINGS: LazyLock<RwLock<Mappings>> = LazyLock::new(|| RwLock::new(FxHashMap::default()));

impl ModelClass {
    /// Registers the conversion of this class's instances into `target`,
    /// replacing any previous one. Subclasses register their own.
    pub fn set_map_to<F>(&self, target: impl Into<MapTarget>, handler: F) -> &Self
    where
        F: Fn(&Model) -> Result<Value, ModelError> + Send + Sync + 'static,
    {
        let target = target.into();
        debug!(class = %self, %target, "Mapping registered");
        MAPPINGS.write().insert((self.id(), target), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn map_to(&self, target: impl Into<MapTarget>) -> Option<MapHandler> {
        MAPPINGS.read().get(&(self.id(), target.into())).cloned()
    }

    #[must_use]
    pub fn has_mapping(&self, target: impl Into<MapTarget>) -> bool {
        MAPPINGS.read().contains_key(&(self.id(), target.into()))
    }
}

impl Model {
    /// Converts this model with the mapping registered for its class.
    ///
    /// Without a mapping, `lazy` falls back to [`Model::deep_clone`].
    ///
    /// # Errors
    ///
    /// [`ModelError::MissingMapping`] without a mapping when `lazy` is false, or the
    /// handler's own error.
    pub fn map_to(&self, target: impl Into<MapTarget>, lazy: bool) -> Result<Value, ModelError> {
        let target = target.into();
        if let Some(handler) = self.class().map_to(target.clone()) {
            return handler(self);
        }
        if lazy {
            debug!(class = %self.class(), %target, "No mapping registered; cloning instead");
            return Ok(Value::Model(self.deep_clone()));
        }
        Err(ModelError::MissingMapping {
            message: format!("`{}` has no mapping to `{target}`", self.class()).into(),
            context: None,
        })
    }
}
