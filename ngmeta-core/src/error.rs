use crate::instance::ErrorPtr;
use thiserror::Error;

/// Errors raised while resolving metadata, creating providers or running bindings. All of them are
/// programmer errors surfacing at bootstrap time, apart from [Error::NonAssignableExpression] and
/// [Error::InfiniteChangeLoop], which surface during a digest.
#[derive(Error, Clone, Debug)]
pub enum Error {
    #[error("Token must be a class reference to generate a key, got: {0}")]
    InvalidTokenKind(String),
    #[error("Expected a class reference, got: {0}")]
    NotAType(String),
    #[error("Class '{class}' carries multiple role decorators: [{decorators}]. Only a single @Directive/@Component/@Pipe/@Injectable is allowed, optionally combined with one routing decorator on a @Component.")]
    MultipleDecorators { class: String, decorators: String },
    #[error("Missing annotation on constructor parameter {index} of class '{class}'. Every constructor parameter needs @Inject or a resolvable token.")]
    HoleInConstructor { class: String, index: usize },
    #[error("Cannot resolve an injectable name for undecorated class '{0}'")]
    UndecoratedClass(String),
    #[error("Parameter {index} of class '{class}' cannot be both @Self and @SkipSelf")]
    ConflictingModifiers { class: String, index: usize },
    #[error("Component '{0}' implements both AfterContentInit and AfterViewInit - only one is allowed")]
    ConflictingLifecycle(String),
    #[error("Directive '{0}' implements AfterViewInit, but directives have no view - use AfterContentInit")]
    DirectiveViewHook(String),
    #[error("Component '{0}' declares both template and templateUrl")]
    TemplateConflict(String),
    #[error("Expression '{expression}' used with two-way binding for property '{property}' of '{directive}' is non-assignable")]
    NonAssignableExpression {
        expression: String,
        property: String,
        directive: String,
    },
    #[error("Infinite onChanges loop: {0} ngOnChanges iterations reached. Aborting.")]
    InfiniteChangeLoop(usize),
    #[error("Host listener '{method}' only supports `$event` or `$event.path` arguments, got: {argument}")]
    UnsupportedEventParam { method: String, argument: String },
    #[error("Two-way binding of property '{property}' is only allowed on components, '{directive}' is an attribute directive")]
    TwoWayBindingOnDirective { directive: String, property: String },
    #[error("Class '{0}' does not provide a constructor for this role")]
    MissingConstructor(String),
    #[error("No controller instance of directive '{0}' was passed to its link function")]
    MissingController(String),
    #[error("NgModule '{0}' cannot be provided directly - bundle it instead")]
    NgModuleNotProvidable(String),
    #[error("Malformed host listener expression for '{key}': {expression}")]
    MalformedHostListener { key: String, expression: String },
    #[error("Injection error: {0}")]
    Injection(ErrorPtr),
}

impl From<ErrorPtr> for Error {
    fn from(value: ErrorPtr) -> Self {
        Self::Injection(value)
    }
}

/// Errors related to reading positional dependencies handed to constructors.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum DependencyError {
    #[error("No dependency was resolved for parameter {0}")]
    Missing(usize),
    #[error("Dependency at parameter {index} is not of type {expected}")]
    Incompatible { index: usize, expected: &'static str },
}
