#![doc = include_str!("../../../README.md")]

mod apply;
mod argstack;
mod bind;
mod callframe;
mod error;
mod eval;
mod frame;
mod fulfill;
mod function;
mod gc;
mod interp;
pub mod natives;
mod path;
mod reduce;
mod resource;
mod signal;
mod symbol;
pub mod tracer;
mod types;
mod value;

pub use crate::{
    apply::{apply_function_block, apply_function_variadic, redo_call},
    argstack::{ArgStack, StackMark},
    bind::{collect_implicit_locals, rebind_block},
    callframe::{CallFrame, CallFrameArena, FrameId},
    error::{ErrorValue, EvalError},
    eval::{EvalFlags, StepOutcome, eval_step, eval_to_end, run_interpreted_body},
    frame::{Frame, FrameRef},
    fulfill::{CallOutcome, fulfill_and_call},
    function::{FunctionBody, FunctionKind, FunctionValue, NativeFn, ParamDesc, ParamKind},
    gc::{GcGuards, GuardMark},
    interp::{DepthGuard, Interp},
    path::{PathOutcome, PathResult, do_path},
    reduce::{ReduceOutcome, compose_block, reduce_block, reduce_block_preserving_set_words},
    resource::{
        DEFAULT_EVAL_DOSE, DEFAULT_MAX_RECURSION_DEPTH, LimitedTracker, NO_LIMIT_TRACKER, NoLimitTracker,
        ResourceError, ResourceLimits, ResourceTracker,
    },
    signal::{EVALUATION_LIMIT, EVENT_PORT_READY, HALT, RECYCLE, SignalState},
    symbol::{Symbol, Symbols},
    tracer::{EvalTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
    types::{TypeSet, ValueKind},
    value::{Cell, Series, Value, WordValue},
};
