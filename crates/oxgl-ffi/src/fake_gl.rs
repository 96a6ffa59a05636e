//! A software stand-in for the GL entry points the tests reach, resolved
//! through the same loader callback a host passes to `oxgl_init`.
//!
//! Names are handed out lowest-free-first, as drivers commonly do, so a
//! deleted name comes straight back from the next create.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::ptr;

pub const ARRAY_BUFFER: u32 = 0x8892;
pub const VERTEX_SHADER: u32 = 0x8B31;
pub const FRAGMENT_SHADER: u32 = 0x8B30;

const VERSION: u32 = 0x1F02;
const EXTENSIONS: u32 = 0x1F03;
const MAX_COMBINED_TEXTURE_IMAGE_UNITS: u32 = 0x8B4D;
const COMPILE_STATUS: u32 = 0x8B81;
const LINK_STATUS: u32 = 0x8B82;
const INFO_LOG_LENGTH: u32 = 0x8B84;

#[derive(Default)]
pub struct State {
    pub buffers: BTreeSet<u32>,
    pub array_buffer: u32,
    pub current_program: u32,
    pub bind_calls: usize,
    shaders_and_programs: BTreeSet<u32>,
    sources: HashMap<u32, String>,
    compiled: HashMap<u32, bool>,
    attached: Vec<(u32, u32)>,
    linked: HashMap<u32, bool>,
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::default());
}

pub fn state<R>(f: impl FnOnce(&mut State) -> R) -> R {
    STATE.with(|cell| f(&mut cell.borrow_mut()))
}

pub fn reset() {
    state(|s| *s = State::default());
}

fn lowest_free(names: &BTreeSet<u32>) -> u32 {
    (1..).find(|n| !names.contains(n)).unwrap_or(0)
}

fn shader_log(shader: u32) -> String {
    if state(|s| s.compiled.get(&shader).copied().unwrap_or(false)) {
        String::new()
    } else {
        format!("0:1({shader}): error: syntax error\n").repeat(100)
    }
}

fn program_log(program: u32) -> String {
    if state(|s| s.linked.get(&program).copied().unwrap_or(false)) {
        String::new()
    } else {
        format!("program {program}: link failed")
    }
}

unsafe fn write_log(log: &str, buf_size: i32, length: *mut i32, out: *mut c_char) {
    if buf_size <= 0 || out.is_null() {
        return;
    }
    let n = log.len().min(buf_size as usize - 1);
    unsafe {
        ptr::copy_nonoverlapping(log.as_ptr().cast::<c_char>(), out, n);
        *out.add(n) = 0;
        if !length.is_null() {
            *length = n as i32;
        }
    }
}

fn log_length(log: &str) -> i32 {
    if log.is_empty() {
        0
    } else {
        log.len() as i32 + 1
    }
}

extern "system" fn get_string(name: u32) -> *const u8 {
    match name {
        VERSION => b"3.3.0\0".as_ptr(),
        EXTENSIONS => b"\0".as_ptr(),
        _ => ptr::null(),
    }
}

extern "system" fn get_string_no_context(_name: u32) -> *const u8 {
    ptr::null()
}

extern "system" fn get_integerv(pname: u32, data: *mut i32) {
    let value = match pname {
        MAX_COMBINED_TEXTURE_IMAGE_UNITS => 16,
        _ => 0,
    };
    unsafe { *data = value };
}

extern "system" fn gen_buffers(n: i32, out: *mut u32) {
    for i in 0..n.max(0) as usize {
        let name = state(|s| {
            let name = lowest_free(&s.buffers);
            s.buffers.insert(name);
            name
        });
        unsafe { *out.add(i) = name };
    }
}

extern "system" fn delete_buffers(n: i32, names: *const u32) {
    for i in 0..n.max(0) as usize {
        let name = unsafe { *names.add(i) };
        state(|s| {
            s.buffers.remove(&name);
            if s.array_buffer == name {
                s.array_buffer = 0;
            }
        });
    }
}

extern "system" fn bind_buffer(target: u32, buffer: u32) {
    state(|s| {
        s.bind_calls += 1;
        if target == ARRAY_BUFFER {
            s.array_buffer = buffer;
        }
    });
}

fn create_named() -> u32 {
    state(|s| {
        let name = lowest_free(&s.shaders_and_programs);
        s.shaders_and_programs.insert(name);
        name
    })
}

fn delete_named(name: u32) {
    state(|s| {
        s.shaders_and_programs.remove(&name);
        s.sources.remove(&name);
        s.compiled.remove(&name);
        s.linked.remove(&name);
        s.attached.retain(|&(p, sh)| p != name && sh != name);
        if s.current_program == name {
            s.current_program = 0;
        }
    });
}

extern "system" fn create_shader(_kind: u32) -> u32 {
    create_named()
}

extern "system" fn delete_shader(shader: u32) {
    delete_named(shader);
}

extern "system" fn shader_source(
    shader: u32,
    count: i32,
    strings: *const *const c_char,
    lengths: *const i32,
) {
    let mut source = String::new();
    for i in 0..count.max(0) as usize {
        let bytes = unsafe {
            let string = *strings.add(i);
            if lengths.is_null() || *lengths.add(i) < 0 {
                CStr::from_ptr(string).to_bytes()
            } else {
                std::slice::from_raw_parts(string.cast::<u8>(), *lengths.add(i) as usize)
            }
        };
        source.push_str(&String::from_utf8_lossy(bytes));
    }
    state(|s| s.sources.insert(shader, source));
}

extern "system" fn compile_shader(shader: u32) {
    state(|s| {
        let ok = s.sources.get(&shader).is_some_and(|src| !src.contains("error"));
        s.compiled.insert(shader, ok);
    });
}

extern "system" fn get_shaderiv(shader: u32, pname: u32, params: *mut i32) {
    let value = match pname {
        COMPILE_STATUS => i32::from(state(|s| s.compiled.get(&shader).copied().unwrap_or(false))),
        INFO_LOG_LENGTH => log_length(&shader_log(shader)),
        _ => 0,
    };
    unsafe { *params = value };
}

extern "system" fn get_shader_info_log(
    shader: u32,
    buf_size: i32,
    length: *mut i32,
    out: *mut c_char,
) {
    unsafe { write_log(&shader_log(shader), buf_size, length, out) };
}

extern "system" fn create_program() -> u32 {
    create_named()
}

extern "system" fn delete_program(program: u32) {
    delete_named(program);
}

extern "system" fn attach_shader(program: u32, shader: u32) {
    state(|s| s.attached.push((program, shader)));
}

extern "system" fn link_program(program: u32) {
    state(|s| {
        let shaders: Vec<u32> = s
            .attached
            .iter()
            .filter(|(p, _)| *p == program)
            .map(|(_, sh)| *sh)
            .collect();
        let ok = !shaders.is_empty()
            && shaders
                .iter()
                .all(|sh| s.compiled.get(sh).copied().unwrap_or(false));
        s.linked.insert(program, ok);
    });
}

extern "system" fn get_programiv(program: u32, pname: u32, params: *mut i32) {
    let value = match pname {
        LINK_STATUS => i32::from(state(|s| s.linked.get(&program).copied().unwrap_or(false))),
        INFO_LOG_LENGTH => log_length(&program_log(program)),
        _ => 0,
    };
    unsafe { *params = value };
}

extern "system" fn get_program_info_log(
    program: u32,
    buf_size: i32,
    length: *mut i32,
    out: *mut c_char,
) {
    unsafe { write_log(&program_log(program), buf_size, length, out) };
}

extern "system" fn use_program(program: u32) {
    state(|s| s.current_program = program);
}

fn symbol_name<'a>(symbol: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(symbol) }.to_str().unwrap_or("")
}

/// Resolves the entry points above.
pub unsafe extern "C" fn load(symbol: *const c_char, _userdata: *mut c_void) -> *const c_void {
    match symbol_name(symbol) {
        "glGetString" => get_string as *const c_void,
        "glGetIntegerv" => get_integerv as *const c_void,
        "glGenBuffers" => gen_buffers as *const c_void,
        "glDeleteBuffers" => delete_buffers as *const c_void,
        "glBindBuffer" => bind_buffer as *const c_void,
        "glCreateShader" => create_shader as *const c_void,
        "glDeleteShader" => delete_shader as *const c_void,
        "glShaderSource" => shader_source as *const c_void,
        "glCompileShader" => compile_shader as *const c_void,
        "glGetShaderiv" => get_shaderiv as *const c_void,
        "glGetShaderInfoLog" => get_shader_info_log as *const c_void,
        "glCreateProgram" => create_program as *const c_void,
        "glDeleteProgram" => delete_program as *const c_void,
        "glAttachShader" => attach_shader as *const c_void,
        "glLinkProgram" => link_program as *const c_void,
        "glGetProgramiv" => get_programiv as *const c_void,
        "glGetProgramInfoLog" => get_program_info_log as *const c_void,
        "glUseProgram" => use_program as *const c_void,
        _ => ptr::null(),
    }
}

/// Resolves nothing at all.
pub unsafe extern "C" fn load_nothing(
    _symbol: *const c_char,
    _userdata: *mut c_void,
) -> *const c_void {
    ptr::null()
}

/// Resolves `glGetString`, which answers as if no context were current.
pub unsafe extern "C" fn load_without_context(
    symbol: *const c_char,
    _userdata: *mut c_void,
) -> *const c_void {
    match symbol_name(symbol) {
        "glGetString" => get_string_no_context as *const c_void,
        _ => ptr::null(),
    }
}
