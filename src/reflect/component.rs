//! Components, type descriptors and opaque instances
//!
//! A component is the unit a provider ships: a name plus the types it
//! exports. Each type carries its constructors and methods as closures over
//! a type-erased state, so the boundary can build and drive instances it was
//! never compiled against.

use std::any::{self, Any};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::types::{Args, MethodSignature, Value, ValueType};

/// Type-erased instance state
pub type InstanceState = Box<dyn Any + Send>;

/// Constructor closure; `Ok(None)` means the provider declined to build an instance
pub type ConstructorFn =
    Arc<dyn Fn(&Args<'_>) -> anyhow::Result<Option<InstanceState>> + Send + Sync>;

/// Method closure operating on the type-erased state
pub type MethodFn =
    Arc<dyn Fn(&mut (dyn Any + Send), &Args<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// A constructor overload
#[derive(Clone)]
pub struct ConstructorInfo {
    pub params: Vec<ValueType>,
    func: ConstructorFn,
}

impl ConstructorInfo {
    fn matches(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args.iter())
                .all(|(param, arg)| param.accepts(arg))
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("params", &self.params)
            .finish()
    }
}

/// A method overload
#[derive(Clone)]
pub struct MethodInfo {
    pub signature: MethodSignature,
    func: MethodFn,
}

impl MethodInfo {
    pub fn new(signature: MethodSignature, func: MethodFn) -> Self {
        Self { signature, func }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Call the method, converting a panic inside the provider into an error
    pub fn call(&self, state: &mut (dyn Any + Send), args: &[Value]) -> anyhow::Result<Value> {
        let func = &self.func;
        let args = Args::new(args);
        panic::catch_unwind(AssertUnwindSafe(|| func(state, &args)))
            .unwrap_or_else(|payload| Err(panic_error(&self.signature.name, payload)))
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("signature", &self.signature)
            .finish()
    }
}

/// Describes one reflectable type exported by a component
#[derive(Debug, Clone)]
pub struct TypeInfo {
    namespace: String,
    name: String,
    constructors: Vec<ConstructorInfo>,
    methods: Vec<MethodInfo>,
}

impl TypeInfo {
    /// Create a descriptor from a full dotted name, e.g. `YoloSharp.YoloTask`
    pub fn new(full_name: &str) -> Self {
        let (namespace, name) = match full_name.rsplit_once('.') {
            Some((ns, name)) => (ns.to_string(), name.to_string()),
            None => (String::new(), full_name.to_string()),
        };
        Self {
            namespace,
            name,
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name without the namespace
    pub fn short_name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Register a constructor building state of type `T`
    pub fn constructor<T, F>(mut self, params: Vec<ValueType>, f: F) -> Self
    where
        T: Any + Send,
        F: Fn(&Args<'_>) -> anyhow::Result<Option<T>> + Send + Sync + 'static,
    {
        let func: ConstructorFn = Arc::new(move |args: &Args<'_>| {
            Ok(f(args)?.map(|state| Box::new(state) as InstanceState))
        });
        self.constructors.push(ConstructorInfo { params, func });
        self
    }

    /// Register a method operating on state of type `T`
    pub fn method<T, F>(mut self, signature: MethodSignature, f: F) -> Self
    where
        T: Any + Send,
        F: Fn(&mut T, &Args<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let owner = self.full_name();
        let func: MethodFn = Arc::new(move |state: &mut (dyn Any + Send), args: &Args<'_>| {
            let target = state.downcast_mut::<T>().ok_or_else(|| {
                anyhow::anyhow!(
                    "instance of {} does not hold a {}",
                    owner,
                    any::type_name::<T>()
                )
            })?;
            f(target, args)
        });
        self.methods.push(MethodInfo::new(signature, func));
        self
    }

    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// All overloads carrying `name`, in registration order.
    ///
    /// The descriptors outlive the borrowed name.
    pub fn methods_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a MethodInfo> + 'n
    where
        'a: 'n,
    {
        self.methods.iter().filter(move |m| m.name() == name)
    }

    /// Pick the constructor for `args`: exact parameter match first, then arity
    pub fn find_constructor(&self, args: &[Value]) -> Option<&ConstructorInfo> {
        self.constructors
            .iter()
            .find(|c| c.matches(args))
            .or_else(|| self.constructors.iter().find(|c| c.params.len() == args.len()))
    }
}

/// A live instance of a resolved type
pub struct Instance {
    ty: Arc<TypeInfo>,
    state: InstanceState,
}

impl Instance {
    /// Construct an instance of `ty` with positional arguments.
    ///
    /// Returns `Ok(None)` when the provider's constructor yields nothing.
    pub fn construct(ty: &Arc<TypeInfo>, args: &[Value]) -> anyhow::Result<Option<Self>> {
        let ctor = ty.find_constructor(args).ok_or_else(|| {
            anyhow::anyhow!(
                "no constructor on {} accepts {} arguments",
                ty.full_name(),
                args.len()
            )
        })?;

        let func = &ctor.func;
        let call_args = Args::new(args);
        let built = panic::catch_unwind(AssertUnwindSafe(|| func(&call_args)))
            .unwrap_or_else(|payload| Err(panic_error(&ty.full_name(), payload)))?;

        Ok(built.map(|state| Self {
            ty: Arc::clone(ty),
            state,
        }))
    }

    pub fn type_info(&self) -> &Arc<TypeInfo> {
        &self.ty
    }

    pub fn state_mut(&mut self) -> &mut (dyn Any + Send) {
        &mut *self.state
    }

    /// Borrow the state as its concrete type, if it is one
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.state).downcast_ref::<T>()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.full_name())
            .finish()
    }
}

/// A named bundle of exported types
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    version: Option<String>,
    types: Vec<Arc<TypeInfo>>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            types: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Export a type from this component
    pub fn with_type(mut self, ty: TypeInfo) -> Self {
        self.types.push(Arc::new(ty));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn types(&self) -> &[Arc<TypeInfo>] {
        &self.types
    }

    /// Look up an exported type by its full dotted name
    pub fn find_type(&self, full_name: &str) -> Option<&Arc<TypeInfo>> {
        self.types.iter().find(|t| t.full_name() == full_name)
    }
}

/// Render a caught panic payload as an error
pub(crate) fn panic_error(context: &str, payload: Box<dyn Any + Send>) -> anyhow::Error {
    anyhow::anyhow!("{} panicked: {}", context, panic_message(payload.as_ref()))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Export a component from a provider library.
///
/// Generates the `yt_component_entry` symbol the loader looks for. The entry
/// uses the Rust ABI and returns this crate's `Component` by value, so the
/// provider must be built with the same toolchain and the same version of
/// this crate as the bridge that loads it.
///
/// A provider links this crate as an rlib, so its cdylib also exports every
/// `yt_*` entry point. Those copies keep their own task and registry state;
/// callers must bind the bridge library, not the provider.
///
/// ```ignore
/// fn build() -> yolo_task_bridge::reflect::Component { /* ... */ }
/// yolo_task_bridge::declare_component!(build);
/// ```
#[macro_export]
macro_rules! declare_component {
    ($builder:path) => {
        #[no_mangle]
        pub fn yt_component_entry() -> $crate::reflect::Component {
            $builder()
        }
    };
}
