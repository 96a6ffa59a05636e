//! [`GlContext`] over a real OpenGL context, via `glow`.

use std::mem;
use std::num::NonZeroU32;
use std::os::raw::c_void;
use std::panic::{self, AssertUnwindSafe};

use glow::HasContext;
use tracing::{debug, error, info, trace, warn};

use crate::context::GlContext;
use crate::error::{GlError, Result};
use crate::kind::{raw, BindPoint, ResourceKind, ShaderStage};

type GetStringFn = unsafe extern "system" fn(name: u32) -> *const u8;

pub struct GlowContext {
    gl: glow::Context,
}

impl GlowContext {
    /// Resolve entry points through `loader` and wrap the resulting context.
    ///
    /// A context must be current on the calling thread. Fails when the loader
    /// cannot resolve `glGetString`, when no context answers `GL_VERSION`, or
    /// when building the context fails for any other reason.
    ///
    /// # Safety
    ///
    /// `loader` must return valid function pointers (or null) for the context
    /// that is current on this thread.
    pub unsafe fn load(mut loader: impl FnMut(&str) -> *const c_void) -> Result<Self> {
        let get_string = loader("glGetString");
        if get_string.is_null() {
            return Err(GlError::ContextLoad("glGetString is not available".into()));
        }
        // SAFETY: a non-null `glGetString` has this signature.
        let get_string: GetStringFn = unsafe { mem::transmute(get_string) };
        if unsafe { get_string(glow::VERSION) }.is_null() {
            return Err(GlError::ContextLoad("no context is current on this thread".into()));
        }

        let mut resolved = 0usize;
        let mut missing = 0usize;
        let built = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            glow::Context::from_loader_function(|symbol| {
                let ptr = loader(symbol);
                if ptr.is_null() {
                    missing += 1;
                } else {
                    resolved += 1;
                }
                ptr
            })
        }));
        let gl = built.map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            error!("GL context load failed: {reason}");
            GlError::ContextLoad(reason)
        })?;
        debug!("GL entry points: {resolved} resolved, {missing} missing");
        Ok(Self::from_glow(gl))
    }

    /// Wrap an already loaded context. Registers the debug-message sink;
    /// delivery stays off until [`GlContext::set_debug_output`] enables it.
    pub fn from_glow(mut gl: glow::Context) -> Self {
        if gl.supports_debug() {
            // SAFETY: the callback captures nothing and outlives the context.
            unsafe { gl.debug_message_callback(forward_debug_message) };
        }
        let version = gl.version();
        info!(
            "GL {}.{}{}",
            version.major,
            version.minor,
            if version.is_embedded { " ES" } else { "" }
        );
        Self { gl }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    pub fn into_glow(self) -> glow::Context {
        self.gl
    }
}

fn forward_debug_message(source: u32, kind: u32, id: u32, severity: u32, message: &str) {
    if kind == glow::DEBUG_TYPE_ERROR {
        error!(source, id, "GL error: {message}");
        return;
    }
    match severity {
        glow::DEBUG_SEVERITY_HIGH => error!(source, kind, id, "{message}"),
        glow::DEBUG_SEVERITY_MEDIUM => warn!(source, kind, id, "{message}"),
        glow::DEBUG_SEVERITY_LOW => info!(source, kind, id, "{message}"),
        _ => trace!(source, kind, id, "{message}"),
    }
}

fn name(id: u32) -> Option<NonZeroU32> {
    NonZeroU32::new(id)
}

// All `unsafe` below: the context is current on this thread (a precondition of
// constructing `GlowContext`), and names come from this context.
impl GlContext for GlowContext {
    fn create(&self, kind: ResourceKind) -> u32 {
        let created = unsafe {
            match kind {
                ResourceKind::Buffer => self.gl.create_buffer().map(|n| n.0),
                ResourceKind::Program => self.gl.create_program().map(|n| n.0),
                ResourceKind::VertexArray => self.gl.create_vertex_array().map(|n| n.0),
                ResourceKind::Query => self.gl.create_query().map(|n| n.0),
                ResourceKind::TransformFeedback => {
                    self.gl.create_transform_feedback().map(|n| n.0)
                }
                ResourceKind::Sampler => self.gl.create_sampler().map(|n| n.0),
                ResourceKind::Texture => self.gl.create_texture().map(|n| n.0),
                ResourceKind::Renderbuffer => self.gl.create_renderbuffer().map(|n| n.0),
                ResourceKind::Framebuffer => self.gl.create_framebuffer().map(|n| n.0),
                ResourceKind::ProgramPipeline => {
                    Err(GlError::Unsupported("program pipelines").to_string())
                }
                ResourceKind::Shader => Err(GlError::ShaderStageRequired.to_string()),
            }
        };
        match created {
            Ok(id) => id.get(),
            Err(e) => {
                error!("create {kind}: {e}");
                0
            }
        }
    }

    fn create_shader(&self, stage: ShaderStage) -> u32 {
        match unsafe { self.gl.create_shader(stage.as_raw()) } {
            Ok(shader) => shader.0.get(),
            Err(e) => {
                error!("create {stage:?} shader: {e}");
                0
            }
        }
    }

    fn delete(&self, kind: ResourceKind, id: u32) {
        let Some(id) = name(id) else {
            return;
        };
        unsafe {
            match kind {
                ResourceKind::Buffer => self.gl.delete_buffer(glow::NativeBuffer(id)),
                ResourceKind::Shader => self.gl.delete_shader(glow::NativeShader(id)),
                ResourceKind::Program => self.gl.delete_program(glow::NativeProgram(id)),
                ResourceKind::VertexArray => {
                    self.gl.delete_vertex_array(glow::NativeVertexArray(id))
                }
                ResourceKind::Query => self.gl.delete_query(glow::NativeQuery(id)),
                ResourceKind::TransformFeedback => self
                    .gl
                    .delete_transform_feedback(glow::NativeTransformFeedback(id)),
                ResourceKind::Sampler => self.gl.delete_sampler(glow::NativeSampler(id)),
                ResourceKind::Texture => self.gl.delete_texture(glow::NativeTexture(id)),
                ResourceKind::Renderbuffer => {
                    self.gl.delete_renderbuffer(glow::NativeRenderbuffer(id))
                }
                ResourceKind::Framebuffer => {
                    self.gl.delete_framebuffer(glow::NativeFramebuffer(id))
                }
                // Never allocated by this backend.
                ResourceKind::ProgramPipeline => {}
            }
        }
    }

    fn bind(&self, point: BindPoint, id: u32) {
        let id = name(id);
        unsafe {
            match point {
                BindPoint::Buffer(target) => self
                    .gl
                    .bind_buffer(target.as_raw(), id.map(glow::NativeBuffer)),
                BindPoint::Texture(target) => self
                    .gl
                    .bind_texture(target.as_raw(), id.map(glow::NativeTexture)),
                BindPoint::Sampler(unit) => {
                    self.gl.bind_sampler(unit, id.map(glow::NativeSampler))
                }
                BindPoint::Program => self.gl.use_program(id.map(glow::NativeProgram)),
                BindPoint::VertexArray => {
                    self.gl.bind_vertex_array(id.map(glow::NativeVertexArray))
                }
                BindPoint::TransformFeedback => self.gl.bind_transform_feedback(
                    raw::TRANSFORM_FEEDBACK,
                    id.map(glow::NativeTransformFeedback),
                ),
                BindPoint::Renderbuffer => self
                    .gl
                    .bind_renderbuffer(raw::RENDERBUFFER, id.map(glow::NativeRenderbuffer)),
                BindPoint::Framebuffer(target) => self
                    .gl
                    .bind_framebuffer(target.as_raw(), id.map(glow::NativeFramebuffer)),
                BindPoint::ProgramPipeline => {
                    warn!("program pipelines are not available through glow")
                }
            }
        }
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(shader) = name(shader) {
            unsafe { self.gl.shader_source(glow::NativeShader(shader), source) }
        }
    }

    fn compile_shader(&self, shader: u32) {
        if let Some(shader) = name(shader) {
            unsafe { self.gl.compile_shader(glow::NativeShader(shader)) }
        }
    }

    fn compile_status(&self, shader: u32) -> bool {
        name(shader).is_some_and(|shader| unsafe {
            self.gl.get_shader_compile_status(glow::NativeShader(shader))
        })
    }

    fn shader_info_log(&self, shader: u32) -> String {
        name(shader)
            .map(|shader| unsafe { self.gl.get_shader_info_log(glow::NativeShader(shader)) })
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let (Some(program), Some(shader)) = (name(program), name(shader)) {
            unsafe {
                self.gl
                    .attach_shader(glow::NativeProgram(program), glow::NativeShader(shader))
            }
        }
    }

    fn link_program(&self, program: u32) {
        if let Some(program) = name(program) {
            unsafe { self.gl.link_program(glow::NativeProgram(program)) }
        }
    }

    fn link_status(&self, program: u32) -> bool {
        name(program).is_some_and(|program| unsafe {
            self.gl.get_program_link_status(glow::NativeProgram(program))
        })
    }

    fn program_info_log(&self, program: u32) -> String {
        name(program)
            .map(|program| unsafe { self.gl.get_program_info_log(glow::NativeProgram(program)) })
            .unwrap_or_default()
    }

    fn max_texture_units(&self) -> u32 {
        let units = unsafe { self.gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS) };
        units.max(0) as u32
    }

    fn set_debug_output(&self, enable: bool) {
        if !self.gl.supports_debug() {
            warn!("context has no debug output");
            return;
        }
        unsafe {
            if enable {
                self.gl.enable(glow::DEBUG_OUTPUT);
            } else {
                self.gl.disable(glow::DEBUG_OUTPUT);
            }
        }
    }
}
