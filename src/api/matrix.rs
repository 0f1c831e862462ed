//! The method matrix: per module and per HTTP verb, which functions are
//! reachable and how.
//!
//! For every verb a module may expose any number of plain functions, at most
//! one parametrized function and at most one indexed function. Resolution
//! order for `VERB /api/<module>[/<segment>]`:
//!
//! 1. the indexed function, when the segment is absent or `index` and no
//!    plain `index` function exists;
//! 2. the parametrized function, when a segment is present, binding the
//!    segment to its parameter;
//! 3. the plain function named by the segment (`index` when absent).
//!
//! A parametrized function therefore shadows every plain function of the
//! same verb. The builder warns when a module mixes the two.

use std::collections::HashMap;

use axum::http::Method;
use thiserror::Error;
use tracing::{debug, warn};

use super::bolt::MiddlewareRegistry;
use super::route::{RouteKind, RouteSpec};

pub const INDEX_FUNCTION: &str = "index";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("Invalid route specifier '{spec}': {reason}")]
    InvalidSpecifier { spec: String, reason: String },

    #[error("Module {module} already parametrized for {method} method")]
    DuplicateParametrized { module: String, method: String },

    #[error("Module {module} already indexed for {method} method")]
    DuplicateIndexed { module: String, method: String },

    #[error("Unable to find middleware {middleware} required by {module}.{function}")]
    UnknownMiddleware {
        module: String,
        function: String,
        middleware: String,
    },

    #[error("Invalid middleware name '{0}': middleware names start with '__'")]
    InvalidMiddlewareName(String),

    #[error("Middleware '{0}' registered twice")]
    DuplicateMiddleware(String),

    #[error("Function {module}.{function} declared with different middleware stacks")]
    ConflictingStack { module: String, function: String },

    #[error("Module {0} registered twice")]
    DuplicateModule(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRoute {
    pub param: String,
    pub function: String,
}

/// The routes one module exposes, keyed by verb.
#[derive(Debug, Clone, Default)]
pub struct ModuleRoutes {
    pub plain: HashMap<Method, Vec<String>>,
    pub routes_with_params: HashMap<Method, ParamRoute>,
    pub indexed_route: HashMap<Method, String>,
}

impl ModuleRoutes {
    fn has_plain(&self, method: &Method, function: &str) -> bool {
        self.plain
            .get(method)
            .is_some_and(|functions| functions.iter().any(|f| f == function))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Plain { function: String },
    Indexed { function: String },
    Parametrized {
        param: String,
        value: String,
        function: String,
    },
    NotFound,
}

impl Resolution {
    pub fn function(&self) -> Option<&str> {
        match self {
            Self::Plain { function }
            | Self::Indexed { function }
            | Self::Parametrized { function, .. } => Some(function),
            Self::NotFound => None,
        }
    }
}

fn stack_key(module: &str, function: &str) -> String {
    format!("{}.{}", module, function)
}

#[derive(Debug, Clone, Default)]
pub struct MethodMatrix {
    modules: HashMap<String, ModuleRoutes>,
    stacks: HashMap<String, Vec<String>>,
}

impl MethodMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: &str) -> Result<(), MatrixError> {
        if self.modules.contains_key(module) {
            return Err(MatrixError::DuplicateModule(module.to_string()));
        }
        self.modules.insert(module.to_string(), ModuleRoutes::default());
        Ok(())
    }

    /// Registers one route of `module` together with the middleware stack
    /// that guards it. Every guard must already exist in `middlewares`.
    pub fn add_route(
        &mut self,
        module: &str,
        spec: &RouteSpec,
        guards: &[&str],
        middlewares: &MiddlewareRegistry,
    ) -> Result<(), MatrixError> {
        for guard in guards {
            if !middlewares.contains(guard) {
                return Err(MatrixError::UnknownMiddleware {
                    module: module.to_string(),
                    function: spec.function.clone(),
                    middleware: guard.to_string(),
                });
            }
        }

        let key = stack_key(module, &spec.function);
        let stack: Vec<String> = guards.iter().map(|g| g.to_string()).collect();
        match self.stacks.get(&key) {
            Some(existing) if *existing != stack => {
                return Err(MatrixError::ConflictingStack {
                    module: module.to_string(),
                    function: spec.function.clone(),
                });
            }
            Some(_) => {}
            None => {
                self.stacks.insert(key, stack);
            }
        }

        let routes = self.modules.entry(module.to_string()).or_default();
        let method = spec.method.clone();

        match &spec.kind {
            RouteKind::Plain => {
                if routes.routes_with_params.contains_key(&method) {
                    warn!(
                        module = %module,
                        method = %method,
                        function = %spec.function,
                        "Plain function is shadowed by a parametrized route"
                    );
                }
                let functions = routes.plain.entry(method).or_default();
                if !functions.contains(&spec.function) {
                    functions.push(spec.function.clone());
                }
            }
            RouteKind::Parametrized { param } => {
                if routes.routes_with_params.contains_key(&method) {
                    return Err(MatrixError::DuplicateParametrized {
                        module: module.to_string(),
                        method: method.to_string(),
                    });
                }
                if routes.plain.get(&method).is_some_and(|f| !f.is_empty()) {
                    warn!(
                        module = %module,
                        method = %method,
                        function = %spec.function,
                        "Parametrized route shadows plain functions"
                    );
                }
                routes.routes_with_params.insert(
                    method,
                    ParamRoute {
                        param: param.clone(),
                        function: spec.function.clone(),
                    },
                );
            }
            RouteKind::Indexed => {
                if routes.indexed_route.contains_key(&method) {
                    return Err(MatrixError::DuplicateIndexed {
                        module: module.to_string(),
                        method: method.to_string(),
                    });
                }
                routes.indexed_route.insert(method, spec.function.clone());
            }
        }

        Ok(())
    }

    pub fn module(&self, module: &str) -> Option<&ModuleRoutes> {
        self.modules.get(module)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// The ordered middleware names guarding `module.function`.
    pub fn stack(&self, module: &str, function: &str) -> &[String] {
        self.stacks
            .get(&stack_key(module, function))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn resolve(&self, module: &str, method: &Method, fn_name: Option<&str>) -> Resolution {
        let Some(routes) = self.modules.get(module) else {
            debug!(module = %module, "Unknown module");
            return Resolution::NotFound;
        };

        let requested = fn_name.unwrap_or(INDEX_FUNCTION);

        if requested == INDEX_FUNCTION
            && !routes.has_plain(method, INDEX_FUNCTION)
            && let Some(function) = routes.indexed_route.get(method)
        {
            return Resolution::Indexed {
                function: function.clone(),
            };
        }

        if let Some(value) = fn_name
            && let Some(route) = routes.routes_with_params.get(method)
        {
            return Resolution::Parametrized {
                param: route.param.clone(),
                value: value.to_string(),
                function: route.function.clone(),
            };
        }

        if routes.has_plain(method, requested) {
            return Resolution::Plain {
                function: requested.to_string(),
            };
        }

        debug!(module = %module, method = %method, function = %requested, "No route matched");
        Resolution::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::bolt::{Flow, Middleware, MiddlewareResults};
    use crate::api::context::RequestContext;
    use async_trait::async_trait;

    struct Pass;

    #[async_trait]
    impl Middleware for Pass {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            _done: &MiddlewareResults,
        ) -> anyhow::Result<Flow> {
            Ok(Flow::Next(None))
        }
    }

    fn registry() -> MiddlewareRegistry {
        let mut registry = MiddlewareRegistry::new();
        registry.register("__authentication", Pass).unwrap();
        registry.register("__params", Pass).unwrap();
        registry
    }

    fn build(specs: &[&str]) -> Result<MethodMatrix, MatrixError> {
        let registry = registry();
        let mut matrix = MethodMatrix::new();
        matrix.add_module("schools")?;
        for raw in specs {
            let spec = RouteSpec::parse(raw)?;
            matrix.add_route("schools", &spec, &["__authentication"], &registry)?;
        }
        Ok(matrix)
    }

    #[test]
    fn test_plain_route() {
        let matrix = build(&["post=createSchool"]).unwrap();
        assert_eq!(
            matrix.resolve("schools", &Method::POST, Some("createSchool")),
            Resolution::Plain {
                function: "createSchool".into()
            }
        );
        assert_eq!(
            matrix.resolve("schools", &Method::GET, Some("createSchool")),
            Resolution::NotFound
        );
    }

    #[test]
    fn test_parametrized_binds_segment() {
        let matrix = build(&["get=getSchool:id"]).unwrap();
        assert_eq!(
            matrix.resolve("schools", &Method::GET, Some("42")),
            Resolution::Parametrized {
                param: "id".into(),
                value: "42".into(),
                function: "getSchool".into()
            }
        );
    }

    #[test]
    fn test_parametrized_needs_segment() {
        let matrix = build(&["get=getSchool:id"]).unwrap();
        assert_eq!(matrix.resolve("schools", &Method::GET, None), Resolution::NotFound);
    }

    #[test]
    fn test_indexed_without_segment() {
        let matrix = build(&["get=index.getSchools", "get=getSchool:id"]).unwrap();
        assert_eq!(
            matrix.resolve("schools", &Method::GET, None),
            Resolution::Indexed {
                function: "getSchools".into()
            }
        );
        assert_eq!(
            matrix.resolve("schools", &Method::GET, Some("index")),
            Resolution::Indexed {
                function: "getSchools".into()
            }
        );
        assert!(matches!(
            matrix.resolve("schools", &Method::GET, Some("abc")),
            Resolution::Parametrized { .. }
        ));
    }

    #[test]
    fn test_plain_index_beats_indexed() {
        let matrix = build(&["get=index", "get=index.getSchools"]).unwrap();
        assert_eq!(
            matrix.resolve("schools", &Method::GET, None),
            Resolution::Plain {
                function: "index".into()
            }
        );
    }

    #[test]
    fn test_parametrized_shadows_plain() {
        let matrix = build(&["get=stats", "get=getSchool:id"]).unwrap();
        assert!(matches!(
            matrix.resolve("schools", &Method::GET, Some("stats")),
            Resolution::Parametrized { .. }
        ));
    }

    #[test]
    fn test_indexed_is_per_verb() {
        let matrix = build(&["get=index.getSchools", "post=index.createSchool"]).unwrap();
        assert_eq!(
            matrix.resolve("schools", &Method::POST, None).function(),
            Some("createSchool")
        );
        assert_eq!(matrix.resolve("schools", &Method::DELETE, None), Resolution::NotFound);
    }

    #[test]
    fn test_duplicate_parametrized_rejected() {
        let err = build(&["get=getSchool:id", "get=getOther:otherId"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Module schools already parametrized for GET method"
        );
    }

    #[test]
    fn test_duplicate_indexed_rejected() {
        assert!(matches!(
            build(&["get=index.a", "get=index.b"]),
            Err(MatrixError::DuplicateIndexed { .. })
        ));
    }

    #[test]
    fn test_same_verb_param_on_other_verbs_ok() {
        assert!(build(&["get=getSchool:id", "patch=updateSchool:id", "delete=deleteSchool:id"]).is_ok());
    }

    #[test]
    fn test_unknown_middleware_rejected() {
        let registry = registry();
        let mut matrix = MethodMatrix::new();
        matrix.add_module("schools").unwrap();
        let spec = RouteSpec::parse("get=index.getSchools").unwrap();
        let err = matrix
            .add_route("schools", &spec, &["__missing"], &registry)
            .unwrap_err();
        assert!(err.to_string().contains("Unable to find middleware __missing"));
    }

    #[test]
    fn test_stack_is_ordered_and_keyed() {
        let registry = registry();
        let mut matrix = MethodMatrix::new();
        matrix.add_module("schools").unwrap();
        let spec = RouteSpec::parse("get=getSchool:id").unwrap();
        matrix
            .add_route("schools", &spec, &["__authentication", "__params"], &registry)
            .unwrap();
        assert_eq!(matrix.stack("schools", "getSchool"), ["__authentication", "__params"]);
        assert!(matrix.stack("schools", "unknown").is_empty());
    }

    #[test]
    fn test_conflicting_stack_rejected() {
        let registry = registry();
        let mut matrix = MethodMatrix::new();
        matrix.add_module("schools").unwrap();
        let get = RouteSpec::parse("get=lookup").unwrap();
        let post = RouteSpec::parse("post=lookup").unwrap();
        matrix
            .add_route("schools", &get, &["__authentication"], &registry)
            .unwrap();
        assert!(matches!(
            matrix.add_route("schools", &post, &["__params"], &registry),
            Err(MatrixError::ConflictingStack { .. })
        ));
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let mut matrix = MethodMatrix::new();
        matrix.add_module("schools").unwrap();
        assert_eq!(
            matrix.add_module("schools"),
            Err(MatrixError::DuplicateModule("schools".into()))
        );
    }

    #[test]
    fn test_unknown_module() {
        let matrix = build(&["get=index.getSchools"]).unwrap();
        assert_eq!(matrix.resolve("students", &Method::GET, None), Resolution::NotFound);
    }
}
