//! Owning wrappers around context objects.
//!
//! [`Resource`] owns exactly one object name and deletes it when dropped,
//! correcting the binding record first. [`Object`] adds a compile-time kind on
//! top, which is what selects the bind operations available on it.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::error;

use crate::context::BindingContext;
use crate::error::{GlError, Result};
use crate::handle::Handle;
use crate::kind::{BindPoint, ResourceKind, ShaderStage, TextureTarget};

/// An owned object of a kind known only at runtime.
pub struct Resource {
    id: Handle,
    kind: ResourceKind,
    ctx: Rc<BindingContext>,
}

impl Resource {
    /// Allocate one object of `kind` with a single context call.
    pub fn new(ctx: &Rc<BindingContext>, kind: ResourceKind) -> Result<Self> {
        if kind == ResourceKind::Shader {
            return Err(GlError::ShaderStageRequired);
        }
        let id = ctx.allocate(kind);
        Self::adopt(ctx, kind, id)
    }

    pub fn new_shader(ctx: &Rc<BindingContext>, stage: ShaderStage) -> Result<Self> {
        let id = ctx.allocate_shader(stage);
        Self::adopt(ctx, ResourceKind::Shader, id)
    }

    fn adopt(ctx: &Rc<BindingContext>, kind: ResourceKind, id: u32) -> Result<Self> {
        if id == 0 {
            error!("context returned no {kind}; is a context current on this thread?");
            return Err(GlError::Allocation(kind));
        }
        Ok(Self {
            id: Handle::from_raw(id),
            kind,
            ctx: Rc::clone(ctx),
        })
    }

    pub fn id(&self) -> Handle {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn context(&self) -> &Rc<BindingContext> {
        &self.ctx
    }

    /// Move ownership out, leaving `self` holding the sentinel.
    ///
    /// Bindings record names, not owners, so they stay valid and follow the
    /// returned value. Dropping the emptied `self` makes no context call.
    pub fn take(&mut self) -> Self {
        Self {
            id: std::mem::take(&mut self.id),
            kind: self.kind,
            ctx: Rc::clone(&self.ctx),
        }
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.ctx.release(self.kind, self.id);
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Compile-time descriptor of one object kind.
pub trait Kind: sealed::Sealed {
    const KIND: ResourceKind;

    /// Creation-time parameter that stays with the object.
    type Desc: Copy + fmt::Debug;

    fn allocate(ctx: &Rc<BindingContext>, _desc: Self::Desc) -> Result<Resource> {
        Resource::new(ctx, Self::KIND)
    }
}

/// Kind descriptors for [`Object`].
pub mod kinds {
    use super::*;

    macro_rules! plain_kind {
        ($($name:ident),* $(,)?) => {$(
            #[derive(Debug)]
            pub enum $name {}
            impl sealed::Sealed for $name {}
            impl Kind for $name {
                const KIND: ResourceKind = ResourceKind::$name;
                type Desc = ();
            }
        )*};
    }

    plain_kind!(
        Buffer,
        Program,
        VertexArray,
        Query,
        ProgramPipeline,
        TransformFeedback,
        Sampler,
        Renderbuffer,
        Framebuffer,
    );

    #[derive(Debug)]
    pub enum Texture {}
    impl sealed::Sealed for Texture {}
    impl Kind for Texture {
        const KIND: ResourceKind = ResourceKind::Texture;
        type Desc = TextureTarget;
    }

    #[derive(Debug)]
    pub enum Shader {}
    impl sealed::Sealed for Shader {}
    impl Kind for Shader {
        const KIND: ResourceKind = ResourceKind::Shader;
        type Desc = ShaderStage;

        fn allocate(ctx: &Rc<BindingContext>, stage: ShaderStage) -> Result<Resource> {
            Resource::new_shader(ctx, stage)
        }
    }
}

/// An owned object of kind `K`. Move-only; never `Clone`.
pub struct Object<K: Kind> {
    raw: Resource,
    desc: K::Desc,
    _kind: PhantomData<K>,
}

impl<K: Kind> Object<K> {
    pub fn with_desc(ctx: &Rc<BindingContext>, desc: K::Desc) -> Result<Self> {
        Ok(Self {
            raw: K::allocate(ctx, desc)?,
            desc,
            _kind: PhantomData,
        })
    }

    pub fn id(&self) -> Handle {
        self.raw.id()
    }

    pub fn desc(&self) -> K::Desc {
        self.desc
    }

    pub fn context(&self) -> &Rc<BindingContext> {
        self.raw.context()
    }

    /// See [`Resource::take`].
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            desc: self.desc,
            _kind: PhantomData,
        }
    }

    pub fn into_resource(self) -> Resource {
        self.raw
    }

    /// Bind through the owning context. Only reachable from kinds whose bind
    /// points cannot fail.
    pub(crate) fn bind_at(&self, point: BindPoint) {
        if let Err(e) = self.context().bind(point, self.id()) {
            error!("bind {point:?} failed: {e}");
        }
    }
}

impl<K: Kind<Desc = ()>> Object<K> {
    pub fn new(ctx: &Rc<BindingContext>) -> Result<Self> {
        Self::with_desc(ctx, ())
    }
}

impl<K: Kind> fmt::Debug for Object<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("kind", &K::KIND)
            .field("id", &self.id())
            .field("desc", &self.desc)
            .finish()
    }
}
