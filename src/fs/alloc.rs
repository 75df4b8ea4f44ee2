//! ## Frame allocation and offset translation
//!
//! Physical frames are handed out from a single counter shared by every file.
//! Numbers only go up; nothing is ever returned to the pool until the device is powered off.
//! The physical frame number alone fixes the cartridge (`n / cart_size`) and the frame
//! within that cartridge (`n % cart_size`).

use log::debug;
use super::Error;
use super::types::{FileDescriptor,FrameAddr,Geometry};

/// The global frame counter
pub struct FrameAllocator {
    next: usize
}

impl FrameAllocator {
    pub fn new() -> Self {
        Self {
            next: 0
        }
    }
    /// Count of physical frames handed out so far, also the next number to be handed out
    pub fn used(&self) -> usize {
        self.next
    }
    pub fn reset(&mut self) {
        self.next = 0;
    }
    /// Append a fresh physical frame to the file's frame list.
    /// Fails if the file already has its maximum number of frames, or if the device has no
    /// frames left; in either case nothing is consumed.
    pub fn allocate(&mut self,geometry: &Geometry,file: &mut FileDescriptor) -> Result<usize,Error> {
        if file.frame_count() >= geometry.max_frames {
            debug!("{} already has {} frames",file.name,file.frame_count());
            return Err(Error::CapacityExceeded);
        }
        if self.next >= geometry.total_frames() {
            debug!("device is out of frames");
            return Err(Error::CapacityExceeded);
        }
        let phys = self.next;
        file.frames.push(phys);
        self.next += 1;
        debug!("{} logical frame {} -> physical frame {}",file.name,file.frame_count()-1,phys);
        Ok(phys)
    }
    /// Translate a byte offset, allocating the logical frame if the file does not have it yet.
    /// Offsets may reach at most one frame past the file's current frame list.
    pub fn locate_or_allocate(&mut self,geometry: &Geometry,file: &mut FileDescriptor,offset: usize) -> Result<FrameAddr,Error> {
        let logical = offset / geometry.frame_size;
        let phys = match file.frames.get(logical) {
            Some(phys) => *phys,
            None if logical==file.frame_count() => self.allocate(geometry,file)?,
            None => return Err(Error::OutOfRange)
        };
        Ok(physical_addr(geometry,phys,offset % geometry.frame_size))
    }
}

/// Coordinates of a byte within a physical frame
pub fn physical_addr(geometry: &Geometry,phys: usize,offset: usize) -> FrameAddr {
    FrameAddr {
        cart: phys / geometry.cart_size,
        frame: phys % geometry.cart_size,
        offset
    }
}

/// Translate a byte offset within a file, or None if that part of the file has no frame.
pub fn locate(geometry: &Geometry,file: &FileDescriptor,offset: usize) -> Option<FrameAddr> {
    let logical = offset / geometry.frame_size;
    file.frames.get(logical).map(|phys| physical_addr(geometry,*phys,offset % geometry.frame_size))
}
