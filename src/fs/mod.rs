//! # File System Module
//!
//! Presents byte addressable files on top of the cartridge device.  The namespace is flat;
//! a file is found by name and then addressed through a small integer handle.
//!
//! `CartFS` is the device context.  It owns the bus adapter, the file table, the global
//! frame counter, and the cursor recording which cartridge is loaded.  Nothing here is
//! global, so any number of independent devices can exist side by side.
//!
//! * `table` maps names to descriptors and hands out handles
//! * `alloc` assigns physical frames and translates file offsets to device coordinates
//! * `io` is the read, write, and seek path
//! * `lifecycle` is power on and power off
//!
//! Multi-frame writes are not transactional.  If a write fails partway, the frames written
//! before the failure stay on the device, and position and size reflect them.

pub mod types;
pub mod table;
pub mod alloc;
mod io;
mod lifecycle;

use log::error;
use crate::bus::{BusAdapter,Controller};
use crate::{STDRESULT,DYNERR};
use types::{FileDescriptor,Geometry,Handle};

/// Enumerates file system errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("invalid file handle")]
    InvalidHandle,
    #[error("file is closed")]
    ClosedFile,
    #[error("negative length")]
    NegativeLength,
    #[error("capacity exceeded")]
    CapacityExceeded,
    #[error("bus failure")]
    BusFailure,
    #[error("offset out of range")]
    OutOfRange,
    #[error("count exceeds data supplied")]
    ShortBuffer,
    #[error("bad file name")]
    BadName,
    #[error("bad device geometry")]
    BadGeometry
}

/// Bus adapter plus the cartridge cursor.  Loads are only issued when the target
/// cartridge differs from the one already loaded.  Every bus error is reported as
/// `Error::BusFailure`, and forgets the cursor since the device state is then unknown.
struct Drive<C: Controller> {
    bus: BusAdapter<C>,
    loaded: Option<usize>
}

impl <C: Controller> Drive<C> {
    fn fail(&mut self,e: DYNERR) -> DYNERR {
        error!("{}",e);
        self.loaded = None;
        Box::new(Error::BusFailure)
    }
    fn select(&mut self,cart: usize) -> STDRESULT {
        if self.loaded==Some(cart) {
            return Ok(());
        }
        match self.bus.load_cartridge(cart) {
            Ok(()) => {
                self.loaded = Some(cart);
                Ok(())
            },
            Err(e) => Err(self.fail(e))
        }
    }
    fn read_frame(&mut self,frame: usize) -> Result<Vec<u8>,DYNERR> {
        match self.bus.read_frame(frame) {
            Ok(buf) => Ok(buf),
            Err(e) => Err(self.fail(e))
        }
    }
    fn write_frame(&mut self,frame: usize,dat: &[u8]) -> STDRESULT {
        match self.bus.write_frame(frame,dat) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e))
        }
    }
    fn zero_cartridge(&mut self,cart: usize) -> STDRESULT {
        self.loaded = None;
        self.select(cart)?;
        match self.bus.zero_cartridge() {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e))
        }
    }
}

/// The primary interface for file operations, see the module docs.
pub struct CartFS<C: Controller> {
    geometry: Geometry,
    drive: Drive<C>,
    table: table::FileTable,
    alloc: alloc::FrameAllocator
}

impl <C: Controller> CartFS<C> {
    /// Create a file system using the given controller as storage.
    /// The device is not touched until `power_on`.
    pub fn new(ctrl: C,geometry: Geometry) -> Result<Self,DYNERR> {
        geometry.verify()?;
        Ok(Self {
            geometry,
            drive: Drive {
                bus: BusAdapter::new(ctrl,geometry.frame_size),
                loaded: None
            },
            table: table::FileTable::new(&geometry),
            alloc: alloc::FrameAllocator::new()
        })
    }
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
    pub fn get_bus(&self) -> &BusAdapter<C> {
        &self.drive.bus
    }
    pub fn get_bus_mut(&mut self) -> &mut BusAdapter<C> {
        &mut self.drive.bus
    }
    /// Open a file by name, creating it if the name is new.
    pub fn open(&mut self,name: &str) -> Result<Handle,DYNERR> {
        Ok(self.table.open(name)?)
    }
    /// Close an open file.  Content, size, and frames are kept for a later `open`.
    pub fn close(&mut self,fd: Handle) -> STDRESULT {
        Ok(self.table.close(fd)?)
    }
    /// Copy of a file table entry, open or closed
    pub fn stat(&self,fd: Handle) -> Result<FileDescriptor,DYNERR> {
        Ok(self.table.get(fd)?.clone())
    }
    /// Count of physical frames allocated since the last power off
    pub fn frames_used(&self) -> usize {
        self.alloc.used()
    }
    /// Count of physical frames on the device
    pub fn capacity_frames(&self) -> usize {
        self.geometry.total_frames()
    }
    /// Geometry, frame usage, and the file table as a JSON string
    pub fn get_metadata(&self,indent: Option<u16>) -> String {
        let mut root = json::JsonValue::new_object();
        root["geometry"] = self.geometry.to_json();
        root["frames_used"] = self.alloc.used().into();
        root["files"] = json::JsonValue::Array(self.table.iter().map(|(h,fd)| fd.to_json(h)).collect());
        if let Some(spaces) = indent {
            json::stringify_pretty(root,spaces)
        } else {
            json::stringify(root)
        }
    }
}
