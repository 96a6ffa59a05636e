//! # oxgl
//!
//! Owned OpenGL objects with a per-thread binding cache.
//!
//! The context is a global state machine: binding is a round trip, and deleting
//! a bound object silently unbinds it. `oxgl` wraps every object name in an
//! owner that deletes it on drop, and routes every bind through a
//! [`BindingContext`] that skips calls which would not change anything and
//! forgets bindings of deleted objects.
//!
//! ```no_run
//! use oxgl::{BindingContext, Buffer, BufferTarget, GlContext};
//!
//! # fn example(gl: impl GlContext + 'static) -> oxgl::Result<()> {
//! let ctx = BindingContext::new(gl);
//!
//! let vertices = Buffer::new(&ctx)?;
//! vertices.bind(BufferTarget::Array); // one context call
//! vertices.bind(BufferTarget::Array); // none
//!
//! drop(vertices); // deleted; the Array slot now records nothing
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod context;
pub mod error;
pub mod handle;
pub mod kind;
#[cfg(feature = "glow")]
pub mod native;
pub mod objects;
pub mod program;
pub mod resource;

pub use context::{BindingContext, GlContext};
pub use error::{GlError, Result};
pub use handle::Handle;
pub use kind::{
    BindPoint, BufferTarget, FramebufferTarget, ResourceKind, ShaderStage, SlotTopology,
    TextureTarget,
};
#[cfg(feature = "glow")]
pub use native::GlowContext;
pub use objects::{
    Buffer, Framebuffer, Program, ProgramPipeline, Query, Renderbuffer, Sampler, Shader,
    Texture, TransformFeedback, VertexArray,
};
pub use program::INFO_LOG_CAPACITY;
pub use resource::{Kind, Object, Resource};
