use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source of a data-migration function as extracted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSource {
    pub name:   String,
    /// Declared positional parameter names, in order
    #[serde(default)]
    pub params: Vec<String>,
    /// Full source text of the function
    #[serde(default)]
    pub source: String
}

impl FunctionSource {
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = impl Into<String>>,
        source: impl Into<String>
    ) -> Self {
        Self {
            name:   name.into(),
            params: params.into_iter().map(Into::into).collect(),
            source: source.into()
        }
    }
}

/// Callback of a RunPython operation.
///
/// A partial application binds leading positional arguments and keywords of
/// an inner callable; its source is that of the wrapped function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callable {
    Function(FunctionSource),
    Partial {
        func:     Box<Callable>,
        #[serde(default)]
        args:     Vec<Value>,
        #[serde(default)]
        keywords: IndexMap<String, Value>
    }
}

impl From<FunctionSource> for Callable {
    fn from(function: FunctionSource) -> Self {
        Self::Function(function)
    }
}

impl Callable {
    /// The function whose source is inspected, partials unwrapped
    pub fn discover(&self) -> &FunctionSource {
        match self {
            Self::Function(function) => function,
            Self::Partial {
                func, ..
            } => func.discover()
        }
    }

    pub fn name(&self) -> &str {
        &self.discover().name
    }

    pub fn source(&self) -> &str {
        &self.discover().source
    }

    /// Parameters a caller still has to supply.
    ///
    /// Bound positional arguments consume leading parameters; bound
    /// keywords remove the parameter of the same name.
    pub fn effective_params(&self) -> Vec<&str> {
        match self {
            Self::Function(function) => function.params.iter().map(String::as_str).collect(),
            Self::Partial {
                func,
                args,
                keywords
            } => func
                .effective_params()
                .into_iter()
                .skip(args.len())
                .filter(|param| !keywords.contains_key(*param))
                .collect()
        }
    }
}
