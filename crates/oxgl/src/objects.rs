//! Named object types and their bind operations.

use std::rc::Rc;

use crate::context::BindingContext;
use crate::error::Result;
use crate::kind::{BindPoint, BufferTarget, FramebufferTarget, ShaderStage, TextureTarget};
use crate::resource::{kinds, Object};

pub type Buffer = Object<kinds::Buffer>;
pub type Shader = Object<kinds::Shader>;
pub type Program = Object<kinds::Program>;
pub type VertexArray = Object<kinds::VertexArray>;
pub type Query = Object<kinds::Query>;
pub type ProgramPipeline = Object<kinds::ProgramPipeline>;
pub type TransformFeedback = Object<kinds::TransformFeedback>;
pub type Sampler = Object<kinds::Sampler>;
pub type Texture = Object<kinds::Texture>;
pub type Renderbuffer = Object<kinds::Renderbuffer>;
pub type Framebuffer = Object<kinds::Framebuffer>;

impl Object<kinds::Buffer> {
    /// Bind to `target`. The same buffer may occupy several targets.
    pub fn bind(&self, target: BufferTarget) {
        self.bind_at(BindPoint::Buffer(target));
    }
}

impl Object<kinds::Texture> {
    pub fn for_target(ctx: &Rc<BindingContext>, target: TextureTarget) -> Result<Self> {
        Self::with_desc(ctx, target)
    }

    pub fn target(&self) -> TextureTarget {
        self.desc()
    }

    /// Bind to the target this texture was created for.
    pub fn bind(&self) {
        self.bind_at(BindPoint::Texture(self.target()));
    }
}

impl Object<kinds::Sampler> {
    /// Bind to texture unit `unit`. Fails if the context has no such unit.
    pub fn bind(&self, unit: u32) -> Result<()> {
        self.context().bind(BindPoint::Sampler(unit), self.id())?;
        Ok(())
    }
}

impl Object<kinds::Program> {
    /// Make this the current program.
    pub fn bind(&self) {
        self.bind_at(BindPoint::Program);
    }
}

impl Object<kinds::VertexArray> {
    pub fn bind(&self) {
        self.bind_at(BindPoint::VertexArray);
    }
}

impl Object<kinds::ProgramPipeline> {
    pub fn bind(&self) {
        self.bind_at(BindPoint::ProgramPipeline);
    }
}

impl Object<kinds::TransformFeedback> {
    pub fn bind(&self) {
        self.bind_at(BindPoint::TransformFeedback);
    }
}

impl Object<kinds::Renderbuffer> {
    pub fn bind(&self) {
        self.bind_at(BindPoint::Renderbuffer);
    }
}

impl Object<kinds::Framebuffer> {
    /// Bind for both reading and drawing.
    pub fn bind(&self) {
        self.bind_at(BindPoint::Framebuffer(FramebufferTarget::Both));
    }

    pub fn bind_read(&self) {
        self.bind_at(BindPoint::Framebuffer(FramebufferTarget::Read));
    }

    pub fn bind_draw(&self) {
        self.bind_at(BindPoint::Framebuffer(FramebufferTarget::Draw));
    }
}

impl Object<kinds::Shader> {
    pub fn for_stage(ctx: &Rc<BindingContext>, stage: ShaderStage) -> Result<Self> {
        Self::with_desc(ctx, stage)
    }

    pub fn stage(&self) -> ShaderStage {
        self.desc()
    }
}
