//! C FFI bindings for oxgl.
//!
//! Exposes context loading, the debug-output toggle, a logger callback, and
//! create/bind/destroy/build entry points over raw object names. Objects live
//! in a per-thread table keyed by kind and name, so the thread that called
//! `oxgl_init` is the only one that can use them, matching the thread affinity
//! of the GL context itself.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::rc::Rc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use ahash::AHashMap;
use oxgl::{
    BindPoint, BindingContext, BufferTarget, FramebufferTarget, GlowContext, Handle, Program,
    Resource, ResourceKind, Shader, ShaderStage, TextureTarget,
};

#[cfg(test)]
mod fake_gl;

// ---------------------------------------------------------------------------
// Thread-local state
// ---------------------------------------------------------------------------

/// An object owned on behalf of C. Shaders and programs keep their typed
/// wrappers so builds go through the library's build operations.
enum Owned {
    Shader(Shader),
    Program(Program),
    Other(Resource),
}

impl Owned {
    fn key(&self) -> (ResourceKind, u32) {
        match self {
            Owned::Shader(s) => (ResourceKind::Shader, s.id().raw()),
            Owned::Program(p) => (ResourceKind::Program, p.id().raw()),
            Owned::Other(r) => (r.kind(), r.id().raw()),
        }
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static CONTEXT: RefCell<Option<Rc<BindingContext>>> = const { RefCell::new(None) };
    static OBJECTS: RefCell<AHashMap<(ResourceKind, u32), Owned>> =
        RefCell::new(AHashMap::new());
}

fn set_error(e: impl std::fmt::Display) {
    let msg = CString::new(e.to_string()).unwrap_or_default();
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = Some(msg);
    });
}

fn clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

fn current_context() -> Option<Rc<BindingContext>> {
    let ctx = CONTEXT.with(|cell| cell.borrow().clone());
    if ctx.is_none() {
        set_error("oxgl_init has not been called on this thread");
    }
    ctx
}

fn missing(kind: ResourceKind, id: u32) -> String {
    format!("no live {kind} named {id} on this thread")
}

/// Run `f` on the owned object `(kind, id)`, or record an error.
fn with_object<R>(kind: ResourceKind, id: u32, f: impl FnOnce(&Owned) -> R) -> Option<R> {
    let result = OBJECTS.with(|cell| cell.borrow().get(&(kind, id)).map(f));
    if result.is_none() {
        set_error(missing(kind, id));
    }
    result
}

fn with_shader<R>(id: u32, f: impl FnOnce(&Shader) -> R) -> Option<R> {
    with_object(ResourceKind::Shader, id, |owned| match owned {
        Owned::Shader(shader) => Some(f(shader)),
        _ => None,
    })
    .flatten()
}

fn with_program<R>(id: u32, f: impl FnOnce(&Program) -> R) -> Option<R> {
    with_object(ResourceKind::Program, id, |owned| match owned {
        Owned::Program(program) => Some(f(program)),
        _ => None,
    })
    .flatten()
}

// ---------------------------------------------------------------------------
// C-visible types
// ---------------------------------------------------------------------------

/// Object kinds.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum OxGlKind {
    Buffer = 0,
    Shader = 1,
    Program = 2,
    VertexArray = 3,
    Query = 4,
    ProgramPipeline = 5,
    TransformFeedback = 6,
    Sampler = 7,
    Texture = 8,
    Renderbuffer = 9,
    Framebuffer = 10,
}

impl From<OxGlKind> for ResourceKind {
    fn from(kind: OxGlKind) -> Self {
        match kind {
            OxGlKind::Buffer => ResourceKind::Buffer,
            OxGlKind::Shader => ResourceKind::Shader,
            OxGlKind::Program => ResourceKind::Program,
            OxGlKind::VertexArray => ResourceKind::VertexArray,
            OxGlKind::Query => ResourceKind::Query,
            OxGlKind::ProgramPipeline => ResourceKind::ProgramPipeline,
            OxGlKind::TransformFeedback => ResourceKind::TransformFeedback,
            OxGlKind::Sampler => ResourceKind::Sampler,
            OxGlKind::Texture => ResourceKind::Texture,
            OxGlKind::Renderbuffer => ResourceKind::Renderbuffer,
            OxGlKind::Framebuffer => ResourceKind::Framebuffer,
        }
    }
}

/// Symbol resolver passed to `oxgl_init`. Returns NULL for unknown symbols.
pub type OxGlLoadFn =
    unsafe extern "C" fn(symbol: *const c_char, userdata: *mut c_void) -> *const c_void;

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Log level for the logger callback.
#[repr(C)]
pub enum OxGlLogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

/// Logger callback type.
pub type OxGlLogFn = unsafe extern "C" fn(
    level: OxGlLogLevel,
    message: *const c_char,
    len: usize,
    userdata: *mut c_void,
);

struct LoggerState {
    callback: OxGlLogFn,
    userdata: usize, // stored as usize for Send+Sync
}

// Safety: the caller guarantees the userdata pointer (and callback) are safe
// to call from any thread.
unsafe impl Send for LoggerState {}
unsafe impl Sync for LoggerState {}

static LOGGER: OnceLock<LoggerState> = OnceLock::new();
static MIN_LOG_LEVEL: AtomicU8 = AtomicU8::new(2); // default: Info

/// A tracing layer that forwards events to the C logger callback.
struct FfiLayer;

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FfiLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let Some(state) = LOGGER.get() else {
            return;
        };

        let (level, c_level) = match *event.metadata().level() {
            tracing::Level::TRACE => (0u8, OxGlLogLevel::Trace),
            tracing::Level::DEBUG => (1, OxGlLogLevel::Debug),
            tracing::Level::INFO => (2, OxGlLogLevel::Info),
            tracing::Level::WARN => (3, OxGlLogLevel::Warn),
            tracing::Level::ERROR => (4, OxGlLogLevel::Error),
        };

        if level < MIN_LOG_LEVEL.load(Ordering::Relaxed) {
            return;
        }

        let mut buf = String::new();
        event.record(&mut MessageVisitor(&mut buf));

        if let Ok(c_str) = CString::new(buf) {
            let len = c_str.as_bytes().len();
            unsafe {
                (state.callback)(c_level, c_str.as_ptr(), len, state.userdata as *mut c_void);
            }
        }
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        use std::fmt::Write;
        if field.name() == "message" {
            let _ = write!(self.0, "{:?}", value);
        } else {
            if !self.0.is_empty() {
                self.0.push(' ');
            }
            let _ = write!(self.0, "{}={:?}", field.name(), value);
        }
    }
}

/// Install a logger callback that receives all log messages, including GL
/// debug output once `oxgl_set_debug_logging(true)` is called.
///
/// Can only be called once; subsequent calls only update `min_level`
/// (0=Trace, 1=Debug, 2=Info, 3=Warn, 4=Error).
///
/// # Safety
///
/// - `callback` must be a valid function pointer safe to call from any thread.
/// - `userdata` must remain valid for the lifetime of the process.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn oxgl_set_logger(
    callback: OxGlLogFn,
    userdata: *mut c_void,
    min_level: u8,
) {
    MIN_LOG_LEVEL.store(min_level.min(4), Ordering::Relaxed);

    if LOGGER
        .set(LoggerState {
            callback,
            userdata: userdata as usize,
        })
        .is_ok()
    {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let _ = tracing_subscriber::registry().with(FfiLayer).try_init();
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Load GL entry points for the context current on this thread.
///
/// Returns 0 on success, -1 on error (see `oxgl_error_message`). Calling it
/// again replaces the thread's context, which is refused while objects created
/// on this thread are still live: destroy them or call `oxgl_shutdown` first.
/// A failed call keeps the previous context.
///
/// # Safety
///
/// - A GL context must be current on the calling thread.
/// - `loader` must return valid entry points (or NULL) for that context.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn oxgl_init(loader: OxGlLoadFn, userdata: *mut c_void) -> i32 {
    clear_error();

    let live = OBJECTS.with(|cell| cell.borrow().len());
    if live > 0 {
        set_error(format!(
            "{live} object(s) still live on this thread; destroy them before re-initializing"
        ));
        return -1;
    }

    let resolve = |symbol: &str| match CString::new(symbol) {
        Ok(name) => unsafe { loader(name.as_ptr(), userdata) },
        Err(_) => ptr::null(),
    };

    match unsafe { GlowContext::load(resolve) } {
        Ok(gl) => {
            let ctx = BindingContext::new(gl);
            CONTEXT.with(|cell| *cell.borrow_mut() = Some(ctx));
            0
        }
        Err(e) => {
            set_error(e);
            -1
        }
    }
}

/// Destroy every object created on this thread and drop its context.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_shutdown() {
    clear_error();
    let objects = OBJECTS.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
    drop(objects);
    CONTEXT.with(|cell| cell.borrow_mut().take());
}

/// Enable or disable forwarding of GL debug messages to the logger.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_set_debug_logging(enable: bool) -> i32 {
    clear_error();
    match current_context() {
        Some(ctx) => {
            ctx.set_debug_output(enable);
            0
        }
        None => -1,
    }
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

fn adopt(result: oxgl::Result<Owned>) -> u32 {
    match result {
        Ok(owned) => {
            let key = owned.key();
            OBJECTS.with(|cell| cell.borrow_mut().insert(key, owned));
            key.1
        }
        Err(e) => {
            set_error(e);
            0
        }
    }
}

/// Create one object of `kind` (not a shader; see `oxgl_create_shader`).
///
/// Returns its name, or 0 on error.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_create(kind: OxGlKind) -> u32 {
    clear_error();
    let Some(ctx) = current_context() else {
        return 0;
    };
    adopt(match ResourceKind::from(kind) {
        ResourceKind::Program => Program::new(&ctx).map(Owned::Program),
        kind => Resource::new(&ctx, kind).map(Owned::Other),
    })
}

/// Create a shader object for the GL shader type `stage`
/// (e.g. `GL_VERTEX_SHADER`). Returns its name, or 0 on error.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_create_shader(stage: u32) -> u32 {
    clear_error();
    let Some(ctx) = current_context() else {
        return 0;
    };
    let Some(stage) = ShaderStage::from_raw(stage) else {
        set_error(format!("0x{stage:04x} is not a shader type"));
        return 0;
    };
    adopt(Shader::for_stage(&ctx, stage).map(Owned::Shader))
}

/// Destroy an object created on this thread. Any binding cached for it is
/// forgotten. Returns 0 on success, -1 if no such object exists.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_destroy(kind: OxGlKind, id: u32) -> i32 {
    clear_error();
    let kind = ResourceKind::from(kind);
    let removed = OBJECTS.with(|cell| cell.borrow_mut().remove(&(kind, id)));
    match removed {
        Some(owned) => {
            drop(owned);
            0
        }
        None => {
            set_error(missing(kind, id));
            -1
        }
    }
}

fn bind_point(kind: ResourceKind, target: u32) -> Result<BindPoint, String> {
    let bad_target = || format!("0x{target:04x} is not a {kind} target");
    Ok(match kind {
        ResourceKind::Buffer => {
            BindPoint::Buffer(BufferTarget::from_raw(target).ok_or_else(bad_target)?)
        }
        ResourceKind::Texture => {
            BindPoint::Texture(TextureTarget::from_raw(target).ok_or_else(bad_target)?)
        }
        ResourceKind::Framebuffer => {
            BindPoint::Framebuffer(FramebufferTarget::from_raw(target).ok_or_else(bad_target)?)
        }
        ResourceKind::Sampler => BindPoint::Sampler(target),
        ResourceKind::Program => BindPoint::Program,
        ResourceKind::VertexArray => BindPoint::VertexArray,
        ResourceKind::ProgramPipeline => BindPoint::ProgramPipeline,
        ResourceKind::TransformFeedback => BindPoint::TransformFeedback,
        ResourceKind::Renderbuffer => BindPoint::Renderbuffer,
        ResourceKind::Shader | ResourceKind::Query => {
            return Err(format!("a {kind} cannot be bound"));
        }
    })
}

/// Bind object `id` of `kind`, skipping the GL call if it is already bound.
///
/// `target` is the GL target enum for buffers, textures, and framebuffers, the
/// unit index for samplers, and ignored otherwise. `id` 0 unbinds.
///
/// Returns 1 if a GL call was issued, 0 if it was skipped, -1 on error.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_bind(kind: OxGlKind, id: u32, target: u32) -> i32 {
    clear_error();
    let kind = ResourceKind::from(kind);
    let Some(ctx) = current_context() else {
        return -1;
    };
    let point = match bind_point(kind, target) {
        Ok(point) => point,
        Err(e) => {
            set_error(e);
            return -1;
        }
    };
    if id != 0 && with_object(kind, id, |_| ()).is_none() {
        return -1;
    }
    match ctx.bind(point, Handle::from_raw(id)) {
        Ok(issued) => i32::from(issued),
        Err(e) => {
            set_error(e);
            -1
        }
    }
}

// ---------------------------------------------------------------------------
// Shaders and programs
// ---------------------------------------------------------------------------

/// Replace the source of shader `id` and compile it.
///
/// Returns 0 once compilation ran (check `oxgl_compile_success`), -1 on error.
///
/// # Safety
///
/// `source` must be a valid null-terminated UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn oxgl_shader_compile(id: u32, source: *const c_char) -> i32 {
    clear_error();
    if source.is_null() {
        set_error("source must not be NULL");
        return -1;
    }
    let source = match unsafe { CStr::from_ptr(source) }.to_str() {
        Ok(s) => s,
        Err(e) => {
            set_error(format!("invalid UTF-8 in source: {e}"));
            return -1;
        }
    };
    with_shader(id, |shader| shader.compile(source)).map_or(-1, |()| 0)
}

/// 1 if the last compile of shader `id` succeeded, 0 if not, -1 on error.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_compile_success(id: u32) -> i32 {
    clear_error();
    with_shader(id, |shader| i32::from(shader.compile_success())).unwrap_or(-1)
}

/// Attach shader `shader` to program `program`. Returns 0 or -1.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_program_attach(program: u32, shader: u32) -> i32 {
    clear_error();
    let attached = OBJECTS.with(|cell| {
        let objects = cell.borrow();
        let Some(Owned::Program(p)) = objects.get(&(ResourceKind::Program, program)) else {
            return Err(missing(ResourceKind::Program, program));
        };
        let Some(Owned::Shader(s)) = objects.get(&(ResourceKind::Shader, shader)) else {
            return Err(missing(ResourceKind::Shader, shader));
        };
        p.attach_shader(s);
        Ok(())
    });
    match attached {
        Ok(()) => 0,
        Err(e) => {
            set_error(e);
            -1
        }
    }
}

/// Link program `id`. Returns 0 once linking ran, -1 on error.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_program_link(id: u32) -> i32 {
    clear_error();
    with_program(id, |program| program.link()).map_or(-1, |()| 0)
}

/// 1 if the last link of program `id` succeeded, 0 if not, -1 on error.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_link_success(id: u32) -> i32 {
    clear_error();
    with_program(id, |program| i32::from(program.link_success())).unwrap_or(-1)
}

/// Copy the info log of shader or program `id` into `buf` (at most `cap`
/// bytes including the terminator) and return the log length written, or -1
/// on error. With a NULL `buf` or a `cap` of 0, nothing is written and the
/// full length is returned. The log is first capped at the library's info-log
/// capacity.
///
/// # Safety
///
/// `buf` must be valid for writes of `cap` bytes, or NULL when `cap` is 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn oxgl_info_log(
    kind: OxGlKind,
    id: u32,
    buf: *mut c_char,
    cap: usize,
) -> i64 {
    clear_error();
    let kind = ResourceKind::from(kind);
    let log = match kind {
        ResourceKind::Shader => with_shader(id, |shader| shader.info_log()),
        ResourceKind::Program => with_program(id, |program| program.info_log()),
        _ => {
            set_error(format!("a {kind} has no info log"));
            return -1;
        }
    };
    let Some(log) = log else {
        return -1;
    };
    if buf.is_null() || cap == 0 {
        return log.len() as i64;
    }
    let n = log.len().min(cap - 1);
    unsafe {
        ptr::copy_nonoverlapping(log.as_ptr().cast::<c_char>(), buf, n);
        *buf.add(n) = 0;
    }
    n as i64
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Get the last error message on this thread, or NULL if the last call
/// succeeded.
///
/// The returned pointer is owned by the library and valid until the next
/// FFI call on the same thread.
#[unsafe(no_mangle)]
pub extern "C" fn oxgl_error_message() -> *const c_char {
    LAST_ERROR.with(|cell| {
        let borrow = cell.borrow();
        match borrow.as_ref() {
            Some(s) => s.as_ptr(),
            None => ptr::null(),
        }
    })
}
