//! ## Simulated cartridge controller
//!
//! Holds every cartridge in memory as one flat buffer.  The controller enforces the same
//! rules as the hardware: it must be initialized before use, a cartridge must be loaded
//! before its frames can be touched, and cartridge or frame numbers beyond the geometry
//! are refused.  Any refusal is reported by setting the return bit.
//!
//! Faults can be injected with `fail_after`, which lets a fixed number of requests
//! through and fails every request after that.

use log::debug;
use super::{Command,Controller,Opcode};
use crate::fs::types::Geometry;

pub struct SimController {
    frame_size: usize,
    cart_size: usize,
    max_carts: usize,
    data: Vec<u8>,
    initialized: bool,
    loaded: Option<usize>,
    fail_after: Option<usize>,
    history: Vec<Opcode>
}

impl SimController {
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            frame_size: geometry.frame_size,
            cart_size: geometry.cart_size,
            max_carts: geometry.max_carts,
            data: vec![0;geometry.frame_size*geometry.cart_size*geometry.max_carts],
            initialized: false,
            loaded: None,
            fail_after: None,
            history: Vec::new()
        }
    }
    /// Let `count` more requests succeed, then fail all subsequent requests
    pub fn fail_after(&mut self,count: usize) {
        self.fail_after = Some(self.history.len() + count);
    }
    /// Stop injecting faults
    pub fn heal(&mut self) {
        self.fail_after = None;
    }
    /// Opcodes of every request received, including refused ones
    pub fn history(&self) -> &Vec<Opcode> {
        &self.history
    }
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
    pub fn loaded(&self) -> Option<usize> {
        self.loaded
    }
    /// Raw cartridge contents, cartridge 0 first, frames in order within each cartridge
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }
    /// Contents of one frame, bypassing the bus
    pub fn peek_frame(&self,cart: usize,frame: usize) -> Option<&[u8]> {
        if cart >= self.max_carts || frame >= self.cart_size {
            return None;
        }
        let beg = (cart*self.cart_size + frame)*self.frame_size;
        Some(&self.data[beg..beg+self.frame_size])
    }
    fn frame_range(&self,frame: usize) -> Option<std::ops::Range<usize>> {
        match self.loaded {
            Some(cart) if frame < self.cart_size => {
                let beg = (cart*self.cart_size + frame)*self.frame_size;
                Some(beg..beg+self.frame_size)
            },
            _ => None
        }
    }
    /// Carry out the request, returning false if the device refuses it
    fn service(&mut self,cmd: &Command,buf: &mut [u8]) -> bool {
        if cmd.op!=Opcode::Init && !self.initialized {
            debug!("{} before initialization",cmd.op);
            return false;
        }
        match cmd.op {
            Opcode::Init => {
                self.initialized = true;
                self.loaded = None;
                true
            },
            Opcode::LoadCartridge => {
                if cmd.cart as usize >= self.max_carts {
                    debug!("cartridge {} does not exist",cmd.cart);
                    return false;
                }
                self.loaded = Some(cmd.cart as usize);
                true
            },
            Opcode::ZeroCartridge => match self.loaded {
                Some(cart) => {
                    let len = self.cart_size*self.frame_size;
                    self.data[cart*len..(cart+1)*len].fill(0);
                    true
                },
                None => false
            },
            Opcode::ReadFrame => match self.frame_range(cmd.frame as usize) {
                Some(rng) if buf.len()==self.frame_size => {
                    buf.copy_from_slice(&self.data[rng]);
                    true
                },
                _ => false
            },
            Opcode::WriteFrame => match self.frame_range(cmd.frame as usize) {
                Some(rng) if buf.len()==self.frame_size => {
                    self.data[rng].copy_from_slice(buf);
                    true
                },
                _ => false
            },
            Opcode::PowerOff => {
                self.initialized = false;
                self.loaded = None;
                true
            }
        }
    }
}

impl Controller for SimController {
    fn io_bus(&mut self,reg: u64,buf: &mut [u8]) -> u64 {
        let cmd = match Command::decode(reg) {
            Ok(cmd) => cmd,
            Err(_) => return reg | Command { failed: true, ..Command::new(Opcode::Init) }.encode()
        };
        self.history.push(cmd.op);
        let ok = match self.fail_after {
            Some(limit) if self.history.len() > limit => {
                debug!("injected fault on {}",cmd.op);
                false
            },
            _ => self.service(&cmd,buf)
        };
        Command { failed: !ok, ..cmd }.encode()
    }
}
