//! ## File table
//!
//! Entries live in a growable arena.  A handle is the index of an entry, and entries are only
//! removed all at once when the table is reset, so a handle stays valid for the life of the
//! table.  The table may not grow beyond `max_files` entries.

use log::debug;
use super::Error;
use super::types::{FileDescriptor,Geometry,Handle,Status};

pub struct FileTable {
    entries: Vec<FileDescriptor>,
    max_files: usize,
    max_path: usize
}

impl FileTable {
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            entries: Vec::new(),
            max_files: geometry.max_files,
            max_path: geometry.max_path
        }
    }
    /// Forget every entry
    pub fn reset(&mut self) {
        self.entries.clear();
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (Handle,&FileDescriptor)> {
        self.entries.iter().enumerate().map(|(i,fd)| (i as Handle,fd))
    }
    fn index(&self,handle: Handle) -> Result<usize,Error> {
        if handle < 0 || handle as usize >= self.entries.len() {
            debug!("handle {} outside table of {}",handle,self.entries.len());
            return Err(Error::InvalidHandle);
        }
        Ok(handle as usize)
    }
    /// Open by name.  An existing entry is reopened with position 0 and its content intact,
    /// otherwise a new empty entry is created.
    pub fn open(&mut self,name: &str) -> Result<Handle,Error> {
        if name.is_empty() || name.len() > self.max_path {
            debug!("file name length {} not in 1..={}",name.len(),self.max_path);
            return Err(Error::BadName);
        }
        if let Some(idx) = self.entries.iter().position(|fd| fd.name==name) {
            let fd = &mut self.entries[idx];
            fd.status = Status::Open;
            fd.position = 0;
            debug!("reopen {} as {}, size {}",name,idx,fd.size);
            return Ok(idx as Handle);
        }
        if self.entries.len() >= self.max_files {
            debug!("file table is full");
            return Err(Error::CapacityExceeded);
        }
        self.entries.push(FileDescriptor::new(name));
        debug!("create {} as {}",name,self.entries.len()-1);
        Ok((self.entries.len()-1) as Handle)
    }
    pub fn close(&mut self,handle: Handle) -> Result<(),Error> {
        let fd = self.get_open_mut(handle)?;
        fd.status = Status::Closed;
        debug!("close {}",handle);
        Ok(())
    }
    /// Get any entry, open or closed
    pub fn get(&self,handle: Handle) -> Result<&FileDescriptor,Error> {
        let idx = self.index(handle)?;
        Ok(&self.entries[idx])
    }
    /// Get an entry for modification, it must be open
    pub fn get_open_mut(&mut self,handle: Handle) -> Result<&mut FileDescriptor,Error> {
        let idx = self.index(handle)?;
        let fd = &mut self.entries[idx];
        if !fd.is_open() {
            debug!("file {} is closed",handle);
            return Err(Error::ClosedFile);
        }
        Ok(fd)
    }
}
