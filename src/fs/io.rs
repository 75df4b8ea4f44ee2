//! Read, write, and seek.
//!
//! Both transfer paths walk the file one frame at a time.  A frame is always moved whole,
//! so a write reads the frame first and overlays the new bytes, leaving the rest of the
//! frame as it was.

use log::{debug,trace};
use super::{CartFS,Error};
use super::alloc;
use super::types::Handle;
use crate::bus::Controller;
use crate::{STDRESULT,DYNERR};

impl <C: Controller> CartFS<C> {
    /// Read up to `count` bytes from the current position, never past the end of the file.
    /// The position advances by the number of bytes returned.
    /// If the bus fails nothing is returned and the position does not move.
    pub fn read(&mut self,fd: Handle,count: i32) -> Result<Vec<u8>,DYNERR> {
        let geometry = self.geometry;
        let file = self.table.get_open_mut(fd)?;
        if count < 0 {
            return Err(Box::new(Error::NegativeLength));
        }
        let count = usize::min(count as usize,file.size - file.position);
        let mut ans: Vec<u8> = Vec::with_capacity(count);
        let mut pos = file.position;
        while ans.len() < count {
            let addr = match alloc::locate(&geometry,file,pos) {
                Some(addr) => addr,
                None => {
                    debug!("no frame behind offset {} of {}",pos,file.name);
                    return Err(Box::new(Error::OutOfRange));
                }
            };
            let span = usize::min(count - ans.len(),geometry.frame_size - addr.offset);
            trace!("read {} bytes at {}",span,addr);
            self.drive.select(addr.cart)?;
            let buf = self.drive.read_frame(addr.frame)?;
            ans.extend_from_slice(&buf[addr.offset..addr.offset+span]);
            pos += span;
        }
        file.position = pos;
        debug!("read {} bytes from {}, position {}",ans.len(),file.name,file.position);
        Ok(ans)
    }
    /// Write the first `count` bytes of `dat` at the current position, allocating frames as
    /// needed.  Returns `count` on success.  Position advances, and size grows if the write
    /// extends the file.
    ///
    /// A request that would push the file past its frame limit is refused before any I/O.
    /// Running out of device frames or a bus failure stops the write partway; whatever frames
    /// were already written stay written, and position and size account for them.
    pub fn write(&mut self,fd: Handle,dat: &[u8],count: i32) -> Result<usize,DYNERR> {
        let geometry = self.geometry;
        let file = self.table.get_open_mut(fd)?;
        if count < 0 {
            return Err(Box::new(Error::NegativeLength));
        }
        let count = count as usize;
        if count > dat.len() {
            debug!("asked to write {} bytes, given {}",count,dat.len());
            return Err(Box::new(Error::ShortBuffer));
        }
        if file.position + count > geometry.max_file_size() {
            debug!("{} cannot grow past {} bytes",file.name,geometry.max_file_size());
            return Err(Box::new(Error::CapacityExceeded));
        }
        let mut written = 0;
        while written < count {
            let pos = file.position;
            let addr = self.alloc.locate_or_allocate(&geometry,file,pos)?;
            let span = usize::min(count - written,geometry.frame_size - addr.offset);
            trace!("write {} bytes at {}",span,addr);
            self.drive.select(addr.cart)?;
            let mut buf = self.drive.read_frame(addr.frame)?;
            buf[addr.offset..addr.offset+span].copy_from_slice(&dat[written..written+span]);
            self.drive.write_frame(addr.frame,&buf)?;
            written += span;
            file.position += span;
            if file.position > file.size {
                file.size = file.position;
            }
        }
        debug!("wrote {} bytes to {}, position {}, size {}",written,file.name,file.position,file.size);
        Ok(written)
    }
    /// Move the position of an open file, `offset` may be anywhere from 0 to the file size.
    /// No I/O is performed.
    pub fn seek(&mut self,fd: Handle,offset: usize) -> STDRESULT {
        let file = self.table.get_open_mut(fd)?;
        if offset > file.size {
            debug!("seek to {} beyond size {}",offset,file.size);
            return Err(Box::new(Error::OutOfRange));
        }
        file.position = offset;
        Ok(())
    }
}
