use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::cache::{BindingCache, GlobalSlot, ReadDrawSlots, TargetSlots, UnitSlots};
use crate::error::Result;
use crate::handle::Handle;
use crate::kind::{
    BindPoint, BufferTarget, FramebufferTarget, ResourceKind, ShaderStage, TextureTarget,
};

/// The entry points of a current graphics context.
///
/// Every call is synchronous and uses raw object names, 0 meaning "no object".
/// Implementations are only valid on the thread where the context is current.
pub trait GlContext {
    /// Allocate one object of `kind`. Returns 0 on failure.
    ///
    /// Never called with [`ResourceKind::Shader`]; see [`GlContext::create_shader`].
    fn create(&self, kind: ResourceKind) -> u32;

    fn create_shader(&self, stage: ShaderStage) -> u32;

    fn delete(&self, kind: ResourceKind, id: u32);

    fn bind(&self, point: BindPoint, id: u32);

    fn shader_source(&self, shader: u32, source: &str);

    fn compile_shader(&self, shader: u32);

    fn compile_status(&self, shader: u32) -> bool;

    fn shader_info_log(&self, shader: u32) -> String;

    fn attach_shader(&self, program: u32, shader: u32);

    fn link_program(&self, program: u32);

    fn link_status(&self, program: u32) -> bool;

    fn program_info_log(&self, program: u32) -> String;

    /// Number of combined texture image units, the sampler unit capacity.
    fn max_texture_units(&self) -> u32;

    /// Toggle delivery of context debug messages to the diagnostic sink.
    fn set_debug_output(&self, enable: bool);
}

/// Binding state of every kind that has slots.
#[derive(Debug)]
struct BindingTable {
    buffer: BindingCache<TargetSlots<BufferTarget>>,
    texture: BindingCache<TargetSlots<TextureTarget>>,
    sampler: BindingCache<UnitSlots>,
    program: BindingCache<GlobalSlot>,
    vertex_array: BindingCache<GlobalSlot>,
    program_pipeline: BindingCache<GlobalSlot>,
    transform_feedback: BindingCache<GlobalSlot>,
    renderbuffer: BindingCache<GlobalSlot>,
    framebuffer: BindingCache<ReadDrawSlots>,
}

impl BindingTable {
    fn new(texture_units: u32) -> Self {
        Self {
            buffer: BindingCache::default(),
            texture: BindingCache::default(),
            sampler: BindingCache::new(UnitSlots::with_capacity(texture_units)),
            program: BindingCache::default(),
            vertex_array: BindingCache::default(),
            program_pipeline: BindingCache::default(),
            transform_feedback: BindingCache::default(),
            renderbuffer: BindingCache::default(),
            framebuffer: BindingCache::default(),
        }
    }

    fn bind(&mut self, point: BindPoint, id: Handle, issue: impl FnOnce()) -> Result<bool> {
        match point {
            BindPoint::Buffer(target) => self.buffer.bind(target, id, issue),
            BindPoint::Texture(target) => self.texture.bind(target, id, issue),
            BindPoint::Sampler(unit) => self.sampler.bind(unit, id, issue),
            BindPoint::Program => self.program.bind((), id, issue),
            BindPoint::VertexArray => self.vertex_array.bind((), id, issue),
            BindPoint::ProgramPipeline => self.program_pipeline.bind((), id, issue),
            BindPoint::TransformFeedback => self.transform_feedback.bind((), id, issue),
            BindPoint::Renderbuffer => self.renderbuffer.bind((), id, issue),
            BindPoint::Framebuffer(target) => self.framebuffer.bind(target, id, issue),
        }
    }

    fn bound(&self, point: BindPoint) -> Handle {
        match point {
            BindPoint::Buffer(target) => self.buffer.bound(target),
            BindPoint::Texture(target) => self.texture.bound(target),
            BindPoint::Sampler(unit) => self.sampler.bound(unit),
            BindPoint::Program => self.program.bound(()),
            BindPoint::VertexArray => self.vertex_array.bound(()),
            BindPoint::ProgramPipeline => self.program_pipeline.bound(()),
            BindPoint::TransformFeedback => self.transform_feedback.bound(()),
            BindPoint::Renderbuffer => self.renderbuffer.bound(()),
            BindPoint::Framebuffer(target) => self.framebuffer.bound(target),
        }
    }

    fn invalidate(&mut self, kind: ResourceKind, id: Handle) -> usize {
        match kind {
            ResourceKind::Shader | ResourceKind::Query => 0,
            ResourceKind::Buffer => self.buffer.invalidate(id),
            ResourceKind::Texture => self.texture.invalidate(id),
            ResourceKind::Sampler => self.sampler.invalidate(id),
            ResourceKind::Program => self.program.invalidate(id),
            ResourceKind::VertexArray => self.vertex_array.invalidate(id),
            ResourceKind::ProgramPipeline => self.program_pipeline.invalidate(id),
            ResourceKind::TransformFeedback => self.transform_feedback.invalidate(id),
            ResourceKind::Renderbuffer => self.renderbuffer.invalidate(id),
            ResourceKind::Framebuffer => self.framebuffer.invalidate(id),
        }
    }
}

/// A current context plus the binding state this thread has issued to it.
///
/// One per thread that makes a context current. Holds `Rc`/`RefCell` state and
/// is therefore neither `Send` nor `Sync`: bindings cannot leak across threads.
///
/// Deleting objects is left to their owners; a name cannot be released from
/// outside the crate while an owner still holds it:
///
/// ```compile_fail
/// # use std::rc::Rc;
/// # use oxgl::{BindingContext, Handle, ResourceKind};
/// fn release_owned(ctx: &Rc<BindingContext>) {
///     ctx.release(ResourceKind::Buffer, Handle::from_raw(1));
/// }
/// ```
pub struct BindingContext {
    gl: Box<dyn GlContext>,
    table: RefCell<BindingTable>,
    texture_units: u32,
}

impl BindingContext {
    /// Wrap a context that is current on the calling thread. Nothing is
    /// assumed bound.
    pub fn new(gl: impl GlContext + 'static) -> Rc<Self> {
        let texture_units = gl.max_texture_units();
        debug!("binding context: {texture_units} texture units");
        Rc::new(Self {
            gl: Box::new(gl),
            table: RefCell::new(BindingTable::new(texture_units)),
            texture_units,
        })
    }

    pub fn gl(&self) -> &dyn GlContext {
        self.gl.as_ref()
    }

    pub fn texture_units(&self) -> u32 {
        self.texture_units
    }

    /// Bind `id` at `point` unless it is already the recorded occupant.
    ///
    /// Returns whether a context call was issued. Binding an object that has
    /// been deleted is a caller error and is not detected.
    pub fn bind(&self, point: BindPoint, id: Handle) -> Result<bool> {
        let issued = self
            .table
            .borrow_mut()
            .bind(point, id, || self.gl.bind(point, id.raw()))?;
        if issued {
            trace!("bind {point:?} <- {id}");
        } else {
            trace!("bind {point:?} <- {id} (cached)");
        }
        Ok(issued)
    }

    /// Bind the zero object at `point`.
    pub fn unbind(&self, point: BindPoint) -> Result<bool> {
        self.bind(point, Handle::NONE)
    }

    /// Bind the window-system framebuffer for both reading and drawing.
    pub fn bind_default_framebuffer(&self) -> Result<bool> {
        self.unbind(BindPoint::Framebuffer(FramebufferTarget::Both))
    }

    /// The recorded occupant of `point`.
    pub fn bound(&self, point: BindPoint) -> Handle {
        self.table.borrow().bound(point)
    }

    pub(crate) fn allocate(&self, kind: ResourceKind) -> u32 {
        self.gl.create(kind)
    }

    pub(crate) fn allocate_shader(&self, stage: ShaderStage) -> u32 {
        self.gl.create_shader(stage)
    }

    /// Correct the binding record for an object about to be deleted, then
    /// delete it. A sentinel id is ignored.
    pub(crate) fn release(&self, kind: ResourceKind, id: Handle) {
        if id.is_none() {
            return;
        }
        let reset = self.table.borrow_mut().invalidate(kind, id);
        trace!("release {kind} {id}, {reset} slot(s) reset");
        self.gl.delete(kind, id.raw());
    }

    pub fn set_debug_output(&self, enable: bool) {
        debug!("context debug output {}", if enable { "on" } else { "off" });
        self.gl.set_debug_output(enable);
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("table", &self.table)
            .field("texture_units", &self.texture_units)
            .finish_non_exhaustive()
    }
}
