//! Shader compilation and program linking.
//!
//! A build moves an object from unbuilt to built; whether the build succeeded
//! is queried from the context every time and never cached. A failed build
//! leaves the object alive and attachable but unusable for draws, and nothing
//! here refuses to use it: callers check the status.

use tracing::warn;

use crate::objects::{Program, Shader};

/// Size of the buffer diagnostic logs are read into, terminator included.
pub const INFO_LOG_CAPACITY: usize = 1024;

/// Clip `log` to what fits in [`INFO_LOG_CAPACITY`], on a char boundary.
pub fn truncate_info_log(mut log: String) -> String {
    let max = INFO_LOG_CAPACITY - 1;
    if log.len() > max {
        let mut end = max;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}

impl Shader {
    /// Replace the source and compile it.
    pub fn compile(&self, source: &str) {
        let gl = self.context().gl();
        let id = self.id().raw();
        gl.shader_source(id, source);
        gl.compile_shader(id);
        if !gl.compile_status(id) {
            warn!("{:?} shader {} failed to compile", self.stage(), self.id());
        }
    }

    /// Outcome of the last [`Shader::compile`].
    pub fn compile_success(&self) -> bool {
        self.context().gl().compile_status(self.id().raw())
    }

    pub fn info_log(&self) -> String {
        truncate_info_log(self.context().gl().shader_info_log(self.id().raw()))
    }
}

impl Program {
    pub fn attach_shader(&self, shader: &Shader) {
        self.context()
            .gl()
            .attach_shader(self.id().raw(), shader.id().raw());
    }

    pub fn link(&self) {
        let gl = self.context().gl();
        gl.link_program(self.id().raw());
        if !gl.link_status(self.id().raw()) {
            warn!("program {} failed to link", self.id());
        }
    }

    /// Outcome of the last [`Program::link`].
    pub fn link_success(&self) -> bool {
        self.context().gl().link_status(self.id().raw())
    }

    pub fn info_log(&self) -> String {
        truncate_info_log(self.context().gl().program_info_log(self.id().raw()))
    }
}
