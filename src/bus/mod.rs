//! # Bus Module
//!
//! The cartridge device is driven through a single 64 bit transfer register.
//! A request is packed into the register, handed to the controller along with an optional
//! frame buffer, and the controller answers with a register of the same layout in which
//! the return bit reports success (0) or failure (1).
//!
//! ## Register Layout
//!
//! ```text
//! bits 63..56  KY1  opcode
//! bits 55..48  KY2  secondary key, unused by the defined opcodes
//! bit  47      RT1  return bit
//! bits 46..31  CT1  cartridge number
//! bits 30..15  FM1  frame number
//! bits 14..0   unused
//! ```
//!
//! Nothing outside this module deals with bit positions.  The `Command` struct is the typed
//! form of the register, `Controller` is the device seam, and `BusAdapter` turns the return
//! bit into a `Result`.

pub mod sim;

use std::fmt;
use log::trace;
use num_traits::FromPrimitive;
use num_derive::FromPrimitive;
use crate::{STDRESULT,DYNERR};

const KY1_SHIFT: u32 = 56;
const KY2_SHIFT: u32 = 48;
const RT1_SHIFT: u32 = 47;
const CT1_SHIFT: u32 = 31;
const FM1_SHIFT: u32 = 15;
const FIELD_MASK_8: u64 = 0xff;
const FIELD_MASK_16: u64 = 0xffff;

/// Enumerates bus errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("device reported failure for {0}")]
    Failed(Opcode),
    #[error("frame buffer does not match frame size")]
    BadFrameBuffer,
    #[error("transfer register could not be decoded")]
    BadRegister
}

/// Operations the device understands.
#[derive(FromPrimitive,PartialEq,Eq,Clone,Copy,Debug)]
pub enum Opcode {
    Init = 0,
    ZeroCartridge = 1,
    LoadCartridge = 2,
    ReadFrame = 3,
    WriteFrame = 4,
    PowerOff = 5
}

impl fmt::Display for Opcode {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f,"INIT"),
            Self::ZeroCartridge => write!(f,"ZERO_CARTRIDGE"),
            Self::LoadCartridge => write!(f,"LOAD_CARTRIDGE"),
            Self::ReadFrame => write!(f,"READ_FRAME"),
            Self::WriteFrame => write!(f,"WRITE_FRAME"),
            Self::PowerOff => write!(f,"POWER_OFF")
        }
    }
}

/// Typed form of the transfer register.
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub struct Command {
    pub op: Opcode,
    pub key2: u8,
    pub failed: bool,
    pub cart: u16,
    pub frame: u16
}

impl Command {
    pub fn new(op: Opcode) -> Self {
        Self {
            op,
            key2: 0,
            failed: false,
            cart: 0,
            frame: 0
        }
    }
    pub fn with_cart(op: Opcode,cart: u16) -> Self {
        Self { cart, ..Self::new(op) }
    }
    pub fn with_frame(op: Opcode,frame: u16) -> Self {
        Self { frame, ..Self::new(op) }
    }
    /// Pack into the register word
    pub fn encode(&self) -> u64 {
        ((self.op as u64) << KY1_SHIFT) |
        ((self.key2 as u64) << KY2_SHIFT) |
        ((self.failed as u64) << RT1_SHIFT) |
        ((self.cart as u64) << CT1_SHIFT) |
        ((self.frame as u64) << FM1_SHIFT)
    }
    /// Unpack a register word, fails only if the opcode field is not a known operation
    pub fn decode(reg: u64) -> Result<Self,Error> {
        let op = match Opcode::from_u64((reg >> KY1_SHIFT) & FIELD_MASK_8) {
            Some(op) => op,
            None => return Err(Error::BadRegister)
        };
        Ok(Self {
            op,
            key2: ((reg >> KY2_SHIFT) & FIELD_MASK_8) as u8,
            failed: (reg >> RT1_SHIFT) & 1 == 1,
            cart: ((reg >> CT1_SHIFT) & FIELD_MASK_16) as u16,
            frame: ((reg >> FM1_SHIFT) & FIELD_MASK_16) as u16
        })
    }
}

/// The device seam.  An implementation executes one register request synchronously and
/// answers with a register whose return bit reports the outcome.
/// For `ReadFrame` the controller fills `buf`, for `WriteFrame` it consumes `buf`,
/// other operations receive an empty slice.
pub trait Controller {
    fn io_bus(&mut self,reg: u64,buf: &mut [u8]) -> u64;
}

/// Wraps a controller, issuing typed requests and mapping the return bit to an error.
/// Every request is counted, whether or not it succeeds.
pub struct BusAdapter<C: Controller> {
    ctrl: C,
    frame_size: usize,
    ops: usize
}

impl <C: Controller> BusAdapter<C> {
    pub fn new(ctrl: C,frame_size: usize) -> Self {
        Self {
            ctrl,
            frame_size,
            ops: 0
        }
    }
    /// Number of requests issued so far
    pub fn ops(&self) -> usize {
        self.ops
    }
    pub fn controller(&self) -> &C {
        &self.ctrl
    }
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.ctrl
    }
    fn execute(&mut self,cmd: Command,buf: &mut [u8]) -> STDRESULT {
        trace!("bus {} cart {} frame {}",cmd.op,cmd.cart,cmd.frame);
        self.ops += 1;
        let resp = Command::decode(self.ctrl.io_bus(cmd.encode(),buf))?;
        if resp.failed {
            return Err(Box::new(Error::Failed(cmd.op)));
        }
        Ok(())
    }
    pub fn init(&mut self) -> STDRESULT {
        self.execute(Command::new(Opcode::Init),&mut [])
    }
    pub fn load_cartridge(&mut self,cart: usize) -> STDRESULT {
        self.execute(Command::with_cart(Opcode::LoadCartridge,cart as u16),&mut [])
    }
    /// Zero every frame of the loaded cartridge
    pub fn zero_cartridge(&mut self) -> STDRESULT {
        self.execute(Command::new(Opcode::ZeroCartridge),&mut [])
    }
    /// Read a whole frame of the loaded cartridge
    pub fn read_frame(&mut self,frame: usize) -> Result<Vec<u8>,DYNERR> {
        let mut buf = vec![0;self.frame_size];
        self.execute(Command::with_frame(Opcode::ReadFrame,frame as u16),&mut buf)?;
        Ok(buf)
    }
    /// Write a whole frame of the loaded cartridge
    pub fn write_frame(&mut self,frame: usize,dat: &[u8]) -> STDRESULT {
        if dat.len()!=self.frame_size {
            return Err(Box::new(Error::BadFrameBuffer));
        }
        let mut buf = dat.to_vec();
        self.execute(Command::with_frame(Opcode::WriteFrame,frame as u16),&mut buf)
    }
    pub fn power_off(&mut self) -> STDRESULT {
        self.execute(Command::new(Opcode::PowerOff),&mut [])
    }
}
