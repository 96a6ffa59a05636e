//! Object kinds, their slot topologies, and the closed set of bind points.
//!
//! Every kind maps to exactly one [`SlotTopology`]. The mapping is an
//! exhaustive match, so adding a kind without deciding how it binds does not
//! compile.

use std::fmt;

/// GL enum values used by the bind points below.
pub mod raw {
    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;
    pub const PIXEL_PACK_BUFFER: u32 = 0x88EB;
    pub const PIXEL_UNPACK_BUFFER: u32 = 0x88EC;
    pub const UNIFORM_BUFFER: u32 = 0x8A11;
    pub const TEXTURE_BUFFER: u32 = 0x8C2A;
    pub const TRANSFORM_FEEDBACK_BUFFER: u32 = 0x8C8E;
    pub const COPY_READ_BUFFER: u32 = 0x8F36;
    pub const COPY_WRITE_BUFFER: u32 = 0x8F37;
    pub const DRAW_INDIRECT_BUFFER: u32 = 0x8F3F;
    pub const SHADER_STORAGE_BUFFER: u32 = 0x90D2;
    pub const DISPATCH_INDIRECT_BUFFER: u32 = 0x90EE;
    pub const QUERY_BUFFER: u32 = 0x9192;
    pub const ATOMIC_COUNTER_BUFFER: u32 = 0x92C0;

    pub const TEXTURE_1D: u32 = 0x0DE0;
    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE_3D: u32 = 0x806F;
    pub const TEXTURE_1D_ARRAY: u32 = 0x8C18;
    pub const TEXTURE_2D_ARRAY: u32 = 0x8C1A;
    pub const TEXTURE_RECTANGLE: u32 = 0x84F5;
    pub const TEXTURE_CUBE_MAP: u32 = 0x8513;
    pub const TEXTURE_CUBE_MAP_ARRAY: u32 = 0x9009;
    pub const TEXTURE_2D_MULTISAMPLE: u32 = 0x9100;
    pub const TEXTURE_2D_MULTISAMPLE_ARRAY: u32 = 0x9102;

    pub const COMPUTE_SHADER: u32 = 0x91B9;
    pub const VERTEX_SHADER: u32 = 0x8B31;
    pub const FRAGMENT_SHADER: u32 = 0x8B30;
    pub const GEOMETRY_SHADER: u32 = 0x8DD9;
    pub const TESS_CONTROL_SHADER: u32 = 0x8E88;
    pub const TESS_EVALUATION_SHADER: u32 = 0x8E87;

    pub const FRAMEBUFFER: u32 = 0x8D40;
    pub const READ_FRAMEBUFFER: u32 = 0x8CA8;
    pub const DRAW_FRAMEBUFFER: u32 = 0x8CA9;
    pub const RENDERBUFFER: u32 = 0x8D41;
    pub const TRANSFORM_FEEDBACK: u32 = 0x8E22;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Shader,
    Program,
    VertexArray,
    Query,
    ProgramPipeline,
    TransformFeedback,
    Sampler,
    Texture,
    Renderbuffer,
    Framebuffer,
}

/// The shape of a kind's binding slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTopology {
    /// Never bound; no cache.
    None,
    /// One global bind point.
    Single,
    /// Indexed units `0..capacity`.
    Units,
    /// One slot per target enum.
    Targeted,
    /// Separate read and draw slots.
    ReadDraw,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Buffer,
        ResourceKind::Shader,
        ResourceKind::Program,
        ResourceKind::VertexArray,
        ResourceKind::Query,
        ResourceKind::ProgramPipeline,
        ResourceKind::TransformFeedback,
        ResourceKind::Sampler,
        ResourceKind::Texture,
        ResourceKind::Renderbuffer,
        ResourceKind::Framebuffer,
    ];

    pub const fn topology(self) -> SlotTopology {
        match self {
            ResourceKind::Shader | ResourceKind::Query => SlotTopology::None,
            ResourceKind::Program
            | ResourceKind::VertexArray
            | ResourceKind::ProgramPipeline
            | ResourceKind::TransformFeedback
            | ResourceKind::Renderbuffer => SlotTopology::Single,
            ResourceKind::Sampler => SlotTopology::Units,
            ResourceKind::Buffer | ResourceKind::Texture => SlotTopology::Targeted,
            ResourceKind::Framebuffer => SlotTopology::ReadDraw,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Shader => "shader",
            ResourceKind::Program => "program",
            ResourceKind::VertexArray => "vertex array",
            ResourceKind::Query => "query",
            ResourceKind::ProgramPipeline => "program pipeline",
            ResourceKind::TransformFeedback => "transform feedback",
            ResourceKind::Sampler => "sampler",
            ResourceKind::Texture => "texture",
            ResourceKind::Renderbuffer => "renderbuffer",
            ResourceKind::Framebuffer => "framebuffer",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Buffer bind targets. One buffer may be bound to several at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
    PixelPack,
    PixelUnpack,
    Uniform,
    Texture,
    TransformFeedback,
    CopyRead,
    CopyWrite,
    DrawIndirect,
    ShaderStorage,
    DispatchIndirect,
    Query,
    AtomicCounter,
}

impl BufferTarget {
    pub const fn as_raw(self) -> u32 {
        match self {
            BufferTarget::Array => raw::ARRAY_BUFFER,
            BufferTarget::ElementArray => raw::ELEMENT_ARRAY_BUFFER,
            BufferTarget::PixelPack => raw::PIXEL_PACK_BUFFER,
            BufferTarget::PixelUnpack => raw::PIXEL_UNPACK_BUFFER,
            BufferTarget::Uniform => raw::UNIFORM_BUFFER,
            BufferTarget::Texture => raw::TEXTURE_BUFFER,
            BufferTarget::TransformFeedback => raw::TRANSFORM_FEEDBACK_BUFFER,
            BufferTarget::CopyRead => raw::COPY_READ_BUFFER,
            BufferTarget::CopyWrite => raw::COPY_WRITE_BUFFER,
            BufferTarget::DrawIndirect => raw::DRAW_INDIRECT_BUFFER,
            BufferTarget::ShaderStorage => raw::SHADER_STORAGE_BUFFER,
            BufferTarget::DispatchIndirect => raw::DISPATCH_INDIRECT_BUFFER,
            BufferTarget::Query => raw::QUERY_BUFFER,
            BufferTarget::AtomicCounter => raw::ATOMIC_COUNTER_BUFFER,
        }
    }

    pub const fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            raw::ARRAY_BUFFER => BufferTarget::Array,
            raw::ELEMENT_ARRAY_BUFFER => BufferTarget::ElementArray,
            raw::PIXEL_PACK_BUFFER => BufferTarget::PixelPack,
            raw::PIXEL_UNPACK_BUFFER => BufferTarget::PixelUnpack,
            raw::UNIFORM_BUFFER => BufferTarget::Uniform,
            raw::TEXTURE_BUFFER => BufferTarget::Texture,
            raw::TRANSFORM_FEEDBACK_BUFFER => BufferTarget::TransformFeedback,
            raw::COPY_READ_BUFFER => BufferTarget::CopyRead,
            raw::COPY_WRITE_BUFFER => BufferTarget::CopyWrite,
            raw::DRAW_INDIRECT_BUFFER => BufferTarget::DrawIndirect,
            raw::SHADER_STORAGE_BUFFER => BufferTarget::ShaderStorage,
            raw::DISPATCH_INDIRECT_BUFFER => BufferTarget::DispatchIndirect,
            raw::QUERY_BUFFER => BufferTarget::Query,
            raw::ATOMIC_COUNTER_BUFFER => BufferTarget::AtomicCounter,
            _ => return None,
        })
    }
}

/// Texture targets. A texture object is created for exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    D1,
    D2,
    D3,
    D1Array,
    D2Array,
    Rectangle,
    CubeMap,
    CubeMapArray,
    Buffer,
    D2Multisample,
    D2MultisampleArray,
}

impl TextureTarget {
    pub const fn as_raw(self) -> u32 {
        match self {
            TextureTarget::D1 => raw::TEXTURE_1D,
            TextureTarget::D2 => raw::TEXTURE_2D,
            TextureTarget::D3 => raw::TEXTURE_3D,
            TextureTarget::D1Array => raw::TEXTURE_1D_ARRAY,
            TextureTarget::D2Array => raw::TEXTURE_2D_ARRAY,
            TextureTarget::Rectangle => raw::TEXTURE_RECTANGLE,
            TextureTarget::CubeMap => raw::TEXTURE_CUBE_MAP,
            TextureTarget::CubeMapArray => raw::TEXTURE_CUBE_MAP_ARRAY,
            TextureTarget::Buffer => raw::TEXTURE_BUFFER,
            TextureTarget::D2Multisample => raw::TEXTURE_2D_MULTISAMPLE,
            TextureTarget::D2MultisampleArray => raw::TEXTURE_2D_MULTISAMPLE_ARRAY,
        }
    }

    pub const fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            raw::TEXTURE_1D => TextureTarget::D1,
            raw::TEXTURE_2D => TextureTarget::D2,
            raw::TEXTURE_3D => TextureTarget::D3,
            raw::TEXTURE_1D_ARRAY => TextureTarget::D1Array,
            raw::TEXTURE_2D_ARRAY => TextureTarget::D2Array,
            raw::TEXTURE_RECTANGLE => TextureTarget::Rectangle,
            raw::TEXTURE_CUBE_MAP => TextureTarget::CubeMap,
            raw::TEXTURE_CUBE_MAP_ARRAY => TextureTarget::CubeMapArray,
            raw::TEXTURE_BUFFER => TextureTarget::Buffer,
            raw::TEXTURE_2D_MULTISAMPLE => TextureTarget::D2Multisample,
            raw::TEXTURE_2D_MULTISAMPLE_ARRAY => TextureTarget::D2MultisampleArray,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Compute,
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
}

impl ShaderStage {
    pub const fn as_raw(self) -> u32 {
        match self {
            ShaderStage::Compute => raw::COMPUTE_SHADER,
            ShaderStage::Vertex => raw::VERTEX_SHADER,
            ShaderStage::Fragment => raw::FRAGMENT_SHADER,
            ShaderStage::Geometry => raw::GEOMETRY_SHADER,
            ShaderStage::TessControl => raw::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => raw::TESS_EVALUATION_SHADER,
        }
    }

    pub const fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            raw::COMPUTE_SHADER => ShaderStage::Compute,
            raw::VERTEX_SHADER => ShaderStage::Vertex,
            raw::FRAGMENT_SHADER => ShaderStage::Fragment,
            raw::GEOMETRY_SHADER => ShaderStage::Geometry,
            raw::TESS_CONTROL_SHADER => ShaderStage::TessControl,
            raw::TESS_EVALUATION_SHADER => ShaderStage::TessEvaluation,
            _ => return None,
        })
    }
}

/// Which framebuffer slot(s) a bind call writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    /// `GL_FRAMEBUFFER`: rewrites both read and draw.
    Both,
    Read,
    Draw,
}

impl FramebufferTarget {
    pub const fn as_raw(self) -> u32 {
        match self {
            FramebufferTarget::Both => raw::FRAMEBUFFER,
            FramebufferTarget::Read => raw::READ_FRAMEBUFFER,
            FramebufferTarget::Draw => raw::DRAW_FRAMEBUFFER,
        }
    }

    pub const fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            raw::FRAMEBUFFER => FramebufferTarget::Both,
            raw::READ_FRAMEBUFFER => FramebufferTarget::Read,
            raw::DRAW_FRAMEBUFFER => FramebufferTarget::Draw,
            _ => return None,
        })
    }
}

/// One context bind call: the kind being bound plus its slot address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindPoint {
    Buffer(BufferTarget),
    Texture(TextureTarget),
    Sampler(u32),
    Program,
    VertexArray,
    ProgramPipeline,
    TransformFeedback,
    Renderbuffer,
    Framebuffer(FramebufferTarget),
}

impl BindPoint {
    pub const fn kind(self) -> ResourceKind {
        match self {
            BindPoint::Buffer(_) => ResourceKind::Buffer,
            BindPoint::Texture(_) => ResourceKind::Texture,
            BindPoint::Sampler(_) => ResourceKind::Sampler,
            BindPoint::Program => ResourceKind::Program,
            BindPoint::VertexArray => ResourceKind::VertexArray,
            BindPoint::ProgramPipeline => ResourceKind::ProgramPipeline,
            BindPoint::TransformFeedback => ResourceKind::TransformFeedback,
            BindPoint::Renderbuffer => ResourceKind::Renderbuffer,
            BindPoint::Framebuffer(_) => ResourceKind::Framebuffer,
        }
    }
}
