#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use oxgl::{BindPoint, BindingContext, GlContext, ResourceKind, ShaderStage};

/// One call made against the recording context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(ResourceKind, u32),
    CreateShader(ShaderStage, u32),
    Delete(ResourceKind, u32),
    Bind(BindPoint, u32),
    Compile(u32),
    Attach(u32, u32),
    Link(u32),
    DebugOutput(bool),
}

#[derive(Debug, Default)]
pub struct Log {
    pub calls: RefCell<Vec<Call>>,
}

impl Log {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn binds(&self) -> Vec<(BindPoint, u32)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Bind(point, id) => Some((*point, *id)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<(ResourceKind, u32)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Delete(kind, id) => Some((*kind, *id)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

/// A stand-in context that hands out increasing names and records every call.
///
/// Shader sources containing `error` fail to compile; programs with any
/// attached shader that failed to compile fail to link.
pub struct RecordingContext {
    log: Rc<Log>,
    next: Cell<u32>,
    texture_units: u32,
    fail_alloc: bool,
    sources: RefCell<Vec<(u32, String)>>,
    attached: RefCell<Vec<(u32, u32)>>,
    linked: RefCell<Vec<u32>>,
    compiled: RefCell<Vec<u32>>,
}

impl RecordingContext {
    pub fn new(texture_units: u32) -> (Self, Rc<Log>) {
        let log = Rc::new(Log::default());
        (
            Self {
                log: Rc::clone(&log),
                next: Cell::new(1),
                texture_units,
                fail_alloc: false,
                sources: RefCell::default(),
                attached: RefCell::default(),
                linked: RefCell::default(),
                compiled: RefCell::default(),
            },
            log,
        )
    }

    pub fn failing() -> (Self, Rc<Log>) {
        let (mut gl, log) = Self::new(16);
        gl.fail_alloc = true;
        (gl, log)
    }

    fn push(&self, call: Call) {
        self.log.calls.borrow_mut().push(call);
    }

    fn next_name(&self) -> u32 {
        if self.fail_alloc {
            return 0;
        }
        let id = self.next.get();
        self.next.set(id + 1);
        id
    }

    fn source_of(&self, shader: u32) -> Option<String> {
        self.sources
            .borrow()
            .iter()
            .rev()
            .find(|(id, _)| *id == shader)
            .map(|(_, src)| src.clone())
    }

    fn compiled_ok(&self, shader: u32) -> bool {
        self.compiled.borrow().contains(&shader)
            && self
                .source_of(shader)
                .is_some_and(|src| !src.contains("error"))
    }
}

impl GlContext for RecordingContext {
    fn create(&self, kind: ResourceKind) -> u32 {
        let id = self.next_name();
        self.push(Call::Create(kind, id));
        id
    }

    fn create_shader(&self, stage: ShaderStage) -> u32 {
        let id = self.next_name();
        self.push(Call::CreateShader(stage, id));
        id
    }

    fn delete(&self, kind: ResourceKind, id: u32) {
        self.push(Call::Delete(kind, id));
    }

    fn bind(&self, point: BindPoint, id: u32) {
        self.push(Call::Bind(point, id));
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.sources.borrow_mut().push((shader, source.to_string()));
    }

    fn compile_shader(&self, shader: u32) {
        self.compiled.borrow_mut().push(shader);
        self.push(Call::Compile(shader));
    }

    fn compile_status(&self, shader: u32) -> bool {
        self.compiled_ok(shader)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        if self.compiled_ok(shader) {
            String::new()
        } else {
            // Longer than any info log buffer.
            format!("0:1({shader}): error: syntax error\n").repeat(200)
        }
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.attached.borrow_mut().push((program, shader));
        self.push(Call::Attach(program, shader));
    }

    fn link_program(&self, program: u32) {
        self.linked.borrow_mut().push(program);
        self.push(Call::Link(program));
    }

    fn link_status(&self, program: u32) -> bool {
        let attached: Vec<u32> = self
            .attached
            .borrow()
            .iter()
            .filter(|(p, _)| *p == program)
            .map(|(_, s)| *s)
            .collect();
        self.linked.borrow().contains(&program)
            && !attached.is_empty()
            && attached.iter().all(|s| self.compiled_ok(*s))
    }

    fn program_info_log(&self, program: u32) -> String {
        if self.link_status(program) {
            String::new()
        } else {
            format!("program {program}: link failed")
        }
    }

    fn max_texture_units(&self) -> u32 {
        self.texture_units
    }

    fn set_debug_output(&self, enable: bool) {
        self.push(Call::DebugOutput(enable));
    }
}

/// A binding context over a fresh recording context with 16 texture units.
pub fn context() -> (Rc<BindingContext>, Rc<Log>) {
    init_tracing();
    let (gl, log) = RecordingContext::new(16);
    (BindingContext::new(gl), log)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
