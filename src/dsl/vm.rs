use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::ast::{Ast, Gene, Program, Section};
use super::host::HostState;
use super::instruction::{Instruction, Source};
use super::pool::{PooledStack, StackPool};

/// Number of persistent registers per machine.
pub const REGISTER_COUNT: usize = 16;

/// Optional execution bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    /// Stop a phase after this many instructions. `None` runs to completion.
    pub max_steps_per_phase: Option<usize>,
}

/// A runtime fault. Faults are absorbed: the offending instruction does
/// nothing and execution carries on with the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    StackUnderflow,
    StackOverflow,
    RegisterOutOfRange(i16),
    DivideByZero,
    /// `POP` into a constant, only reachable in hand-built programs.
    ConstantTarget,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::StackUnderflow => write!(f, "stack underflow"),
            Fault::StackOverflow => write!(f, "stack overflow"),
            Fault::RegisterOutOfRange(index) => write!(f, "register {index} out of range"),
            Fault::DivideByZero => write!(f, "division by zero"),
            Fault::ConstantTarget => write!(f, "pop into constant"),
        }
    }
}

/// What an observer sees after each executed instruction.
#[derive(Debug)]
pub struct Step<'a> {
    pub gene: usize,
    pub section: Section,
    /// Program counter the instruction ran at.
    pub pc: usize,
    pub instruction: &'a Instruction,
    /// Stack after the instruction.
    pub stack: &'a [i16],
    pub fault: Option<Fault>,
}

/// Interpreter state for one bot.
///
/// Registers survive across genes and ticks; the stack and program counter
/// are reset at the start of every section. A machine is owned by exactly one
/// bot and is never shared between workers.
pub struct Machine {
    pc: usize,
    stack: PooledStack,
    registers: [i16; REGISTER_COUNT],
    program: Arc<Program>,
    activations: Vec<bool>,
    limits: Limits,
    faults: u64,
}

impl Machine {
    /// Machine drawing its stack from the process-wide pool.
    pub fn new(program: Arc<Program>) -> Self {
        Self::with_pool(program, &StackPool::global())
    }

    pub fn with_pool(program: Arc<Program>, pool: &Arc<StackPool>) -> Self {
        let activations = vec![false; program.len()];
        Self {
            pc: 0,
            stack: pool.acquire(),
            registers: [0; REGISTER_COUNT],
            program,
            activations,
            limits: Limits::default(),
            faults: 0,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Swap in a new program. Registers are kept; activations start over.
    pub fn load(&mut self, program: Arc<Program>) {
        self.activations = vec![false; program.len()];
        self.program = program;
        self.pc = 0;
        self.stack.clear();
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn registers(&self) -> &[i16; REGISTER_COUNT] {
        &self.registers
    }

    /// Seed a register. Returns `false` for an out-of-range index.
    pub fn set_register(&mut self, index: usize, value: i16) -> bool {
        match self.registers.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Stack contents as left by the last section that ran.
    pub fn stack(&self) -> &[i16] {
        self.stack.as_slice()
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Per-gene activation from the last tick, for display only.
    pub fn activations(&self) -> &[bool] {
        &self.activations
    }

    /// Runtime faults absorbed since the machine was created.
    pub fn fault_count(&self) -> u64 {
        self.faults
    }

    /// Run one tick: `reset`, every gene in order, then `execute`.
    pub fn run<H: HostState + ?Sized>(&mut self, host: &mut H) {
        self.run_with(host, |_| {});
    }

    /// Like `run`, calling `observe` after every instruction.
    pub fn run_with<H, F>(&mut self, host: &mut H, mut observe: F)
    where
        H: HostState + ?Sized,
        F: FnMut(&Step<'_>),
    {
        host.reset();
        let program = Arc::clone(&self.program);
        for (index, gene) in program.iter().enumerate() {
            let active = self.run_gene(index, gene, host, &mut observe);
            if let Some(slot) = self.activations.get_mut(index) {
                *slot = active;
            }
        }
        host.execute();
    }

    fn run_gene<H, F>(&mut self, index: usize, gene: &Gene, host: &mut H, observe: &mut F) -> bool
    where
        H: HostState + ?Sized,
        F: FnMut(&Step<'_>),
    {
        self.pc = 0;
        self.stack.clear();
        if gene.evaluate().is_empty() {
            return false;
        }
        self.run_section(index, Section::Evaluate, gene.evaluate(), host, observe);

        let active = self.stack.pop().is_some_and(|v| v >= 1);
        if active && !gene.execute().is_empty() {
            self.run_section(index, Section::Execute, gene.execute(), host, observe);
        }
        active
    }

    fn run_section<H, F>(&mut self, gene: usize, section: Section, ast: &Ast, host: &mut H, observe: &mut F)
    where
        H: HostState + ?Sized,
        F: FnMut(&Step<'_>),
    {
        self.pc = 0;
        self.stack.clear();

        for (steps, instruction) in ast.iter().enumerate() {
            if self.limits.max_steps_per_phase.is_some_and(|max| steps >= max) {
                trace!(gene, %section, steps, "step limit reached, section cut short");
                break;
            }

            let pc = self.pc;
            let fault = self.execute(instruction, host).err();
            if let Some(fault) = fault {
                self.faults += 1;
                trace!(gene, %section, pc, %instruction, %fault, "runtime fault absorbed");
            }
            self.pc += instruction.width();

            observe(&Step {
                gene,
                section,
                pc,
                instruction,
                stack: self.stack.as_slice(),
                fault,
            });
        }
    }

    fn execute<H: HostState + ?Sized>(&mut self, instruction: &Instruction, host: &mut H) -> Result<(), Fault> {
        let stack = &mut self.stack;

        match instruction {
            Instruction::Begin(_) | Instruction::Comment(_) | Instruction::Nop | Instruction::Illegal(_) => Ok(()),

            // Sensors
            Instruction::Rdx => push(stack, host.x()),
            Instruction::Rdy => push(stack, host.y()),
            Instruction::Rde => push(stack, host.energy()),

            // Transfer
            Instruction::Push { source: Source::Constant, value } => push(stack, *value),
            Instruction::Push { source: Source::Register, value } => {
                let slot = register_slot(*value)?;
                push(stack, self.registers[slot])
            }
            Instruction::Pop { target: Source::Register, index } => {
                let slot = register_slot(*index)?;
                let value = stack.pop().ok_or(Fault::StackUnderflow)?;
                self.registers[slot] = value;
                Ok(())
            }
            Instruction::Pop { target: Source::Constant, .. } => Err(Fault::ConstantTarget),

            // Comparison
            Instruction::Geq => compare(stack, |a, b| a >= b),
            Instruction::Leq => compare(stack, |a, b| a <= b),
            Instruction::Ieq => compare(stack, |a, b| a == b),
            Instruction::Grt => compare(stack, |a, b| a > b),
            Instruction::Lst => compare(stack, |a, b| a < b),

            // Arithmetic / logic
            Instruction::Not => unary(stack, |a| i16::from(a == 0)),
            Instruction::And => binary(stack, |a, b| a & b),
            Instruction::Ior => binary(stack, |a, b| a | b),
            Instruction::Xor => binary(stack, |a, b| a ^ b),
            Instruction::Add => binary(stack, i16::wrapping_add),
            Instruction::Sub => binary(stack, i16::wrapping_sub),
            Instruction::Mul => binary(stack, i16::wrapping_mul),
            Instruction::Div => {
                // Divisor stays on the stack: nothing is consumed
                if stack.len() >= 2 && stack.peek() == Some(0) {
                    return Err(Fault::DivideByZero);
                }
                binary(stack, i16::wrapping_div)
            }
            Instruction::Neg => unary(stack, i16::wrapping_neg),
            Instruction::Abs => {
                let (x, y) = stack.pop_pair().ok_or(Fault::StackUnderflow)?;
                push(stack, length(x, y))
            }

            // Actuators
            Instruction::Rid => {
                let id = stack.pop().ok_or(Fault::StackUnderflow)?;
                push(stack, host.remote_id(id))
            }
            Instruction::Scn => {
                let (x, y) = stack.pop_pair().ok_or(Fault::StackUnderflow)?;
                let (rx, ry) = host.scan(x, y);
                push(stack, rx)?;
                push(stack, ry)
            }
            Instruction::Thr => {
                let (x, y) = stack.pop_pair().ok_or(Fault::StackUnderflow)?;
                host.thrust(x, y);
                Ok(())
            }
            Instruction::Trn => pop_into(stack, |v| host.turn(v)),
            Instruction::Mne => pop_into(stack, |v| host.mine(v)),
            Instruction::Rep => pop_into(stack, |v| host.reproduce(v)),
            Instruction::Imp => pop_into(stack, |v| host.impulse(v)),
        }
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("pc", &self.pc)
            .field("stack", &self.stack.as_slice())
            .field("registers", &self.registers)
            .field("genes", &self.program.len())
            .field("activations", &self.activations)
            .field("faults", &self.faults)
            .finish_non_exhaustive()
    }
}

fn register_slot(index: i16) -> Result<usize, Fault> {
    usize::try_from(index)
        .ok()
        .filter(|&slot| slot < REGISTER_COUNT)
        .ok_or(Fault::RegisterOutOfRange(index))
}

fn push(stack: &mut PooledStack, value: i16) -> Result<(), Fault> {
    if stack.push(value) {
        Ok(())
    } else {
        Err(Fault::StackOverflow)
    }
}

/// Pop b then a, push `op(a, b)`.
fn binary(stack: &mut PooledStack, op: impl FnOnce(i16, i16) -> i16) -> Result<(), Fault> {
    let (a, b) = stack.pop_pair().ok_or(Fault::StackUnderflow)?;
    push(stack, op(a, b))
}

/// Comparison producing exactly 1 or 0.
fn compare(stack: &mut PooledStack, op: impl FnOnce(i16, i16) -> bool) -> Result<(), Fault> {
    binary(stack, |a, b| i16::from(op(a, b)))
}

fn unary(stack: &mut PooledStack, op: impl FnOnce(i16) -> i16) -> Result<(), Fault> {
    let a = stack.pop().ok_or(Fault::StackUnderflow)?;
    push(stack, op(a))
}

fn pop_into(stack: &mut PooledStack, sink: impl FnOnce(i16)) -> Result<(), Fault> {
    let value = stack.pop().ok_or(Fault::StackUnderflow)?;
    sink(value);
    Ok(())
}

/// Rounded Euclidean length, saturated to `i16::MAX`.
fn length(x: i16, y: i16) -> i16 {
    let len = f64::from(x).hypot(f64::from(y)).round();
    len.min(f64::from(i16::MAX)) as i16
}
