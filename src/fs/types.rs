use std::fmt;
use log::debug;
use super::Error;
use crate::DYNERR;

pub const FRAME_SIZE: usize = 1024;
pub const CART_SIZE: usize = 1024;
pub const MAX_CARTS: usize = 64;
pub const MAX_FILES: usize = 1024;
pub const MAX_FRAMES: usize = 100;
pub const MAX_PATH: usize = 128;

/// Small integer that identifies a file table entry
pub type Handle = i16;

/// Shape and limits of the device and the file table.
/// Cartridge and frame numbers are carried in 16 bit register fields,
/// so `cart_size` and `max_carts` cannot exceed 65536.
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub struct Geometry {
    /// bytes per frame
    pub frame_size: usize,
    /// frames per cartridge
    pub cart_size: usize,
    /// cartridges on the device
    pub max_carts: usize,
    /// entries in the file table
    pub max_files: usize,
    /// logical frames per file
    pub max_frames: usize,
    /// longest file name in bytes
    pub max_path: usize
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            frame_size: FRAME_SIZE,
            cart_size: CART_SIZE,
            max_carts: MAX_CARTS,
            max_files: MAX_FILES,
            max_frames: MAX_FRAMES,
            max_path: MAX_PATH
        }
    }
}

impl Geometry {
    /// Geometry with the given device shape, table limits take defaults
    pub fn new(frame_size: usize,cart_size: usize,max_carts: usize) -> Self {
        Self {
            frame_size,
            cart_size,
            max_carts,
            ..Self::default()
        }
    }
    pub fn verify(&self) -> Result<(),Error> {
        let fields = [
            ("frame_size",self.frame_size),
            ("cart_size",self.cart_size),
            ("max_carts",self.max_carts),
            ("max_files",self.max_files),
            ("max_frames",self.max_frames),
            ("max_path",self.max_path)
        ];
        for (key,val) in fields {
            if val==0 {
                debug!("{} cannot be 0",key);
                return Err(Error::BadGeometry);
            }
        }
        if self.cart_size > 1 << 16 || self.max_carts > 1 << 16 {
            debug!("cartridge or frame numbers will not fit the transfer register");
            return Err(Error::BadGeometry);
        }
        let device_bytes = self.total_frames_checked().and_then(|n| n.checked_mul(self.frame_size));
        if device_bytes.is_none() || self.max_frames.checked_mul(self.frame_size).is_none() {
            debug!("device or file size does not fit in a usize");
            return Err(Error::BadGeometry);
        }
        if self.max_files > Handle::MAX as usize + 1 {
            debug!("table of {} entries cannot be addressed by handles",self.max_files);
            return Err(Error::BadGeometry);
        }
        Ok(())
    }
    fn total_frames_checked(&self) -> Option<usize> {
        self.cart_size.checked_mul(self.max_carts)
    }
    /// Count of physical frames on the whole device
    pub fn total_frames(&self) -> usize {
        self.cart_size * self.max_carts
    }
    /// Largest size any one file can reach
    pub fn max_file_size(&self) -> usize {
        self.max_frames * self.frame_size
    }
    /// Parse a JSON object carrying any subset of the fields, missing fields take defaults.
    pub fn from_json(json_str: &str) -> Result<Self,DYNERR> {
        let parsed = json::parse(json_str)?;
        if !parsed.is_object() {
            debug!("geometry must be a JSON object");
            return Err(Box::new(Error::BadGeometry));
        }
        let mut ans = Self::default();
        for (key,val) in parsed.entries() {
            let n = match val.as_usize() {
                Some(n) => n,
                None => {
                    debug!("value of {} is not a non-negative integer",key);
                    return Err(Box::new(Error::BadGeometry));
                }
            };
            match key {
                "frame_size" => ans.frame_size = n,
                "cart_size" => ans.cart_size = n,
                "max_carts" => ans.max_carts = n,
                "max_files" => ans.max_files = n,
                "max_frames" => ans.max_frames = n,
                "max_path" => ans.max_path = n,
                _ => {
                    debug!("unknown geometry key {}",key);
                    return Err(Box::new(Error::BadGeometry));
                }
            }
        }
        ans.verify()?;
        Ok(ans)
    }
    pub fn to_json(&self) -> json::JsonValue {
        let mut obj = json::JsonValue::new_object();
        obj["frame_size"] = self.frame_size.into();
        obj["cart_size"] = self.cart_size.into();
        obj["max_carts"] = self.max_carts.into();
        obj["max_files"] = self.max_files.into();
        obj["max_frames"] = self.max_frames.into();
        obj["max_path"] = self.max_path.into();
        obj
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"{} cartridges of {} frames of {} bytes",self.max_carts,self.cart_size,self.frame_size)
    }
}

#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum Status {
    Open,
    Closed
}

impl fmt::Display for Status {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f,"open"),
            Self::Closed => write!(f,"closed")
        }
    }
}

/// One entry of the file table.
/// `frames[i]` is the physical frame backing logical frame `i`.
#[derive(Clone,Debug)]
pub struct FileDescriptor {
    pub name: String,
    pub size: usize,
    pub position: usize,
    pub frames: Vec<usize>,
    pub status: Status
}

impl FileDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: 0,
            position: 0,
            frames: Vec::new(),
            status: Status::Open
        }
    }
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
    pub fn is_open(&self) -> bool {
        self.status==Status::Open
    }
    pub fn to_json(&self,handle: Handle) -> json::JsonValue {
        let mut obj = json::JsonValue::new_object();
        obj["handle"] = handle.into();
        obj["name"] = json::JsonValue::String(self.name.clone());
        obj["size"] = self.size.into();
        obj["position"] = self.position.into();
        obj["status"] = json::JsonValue::String(self.status.to_string());
        obj["frames"] = json::JsonValue::Array(self.frames.iter().map(|f| (*f).into()).collect());
        obj
    }
}

/// Physical coordinates of a byte: cartridge, frame within the cartridge, offset within the frame
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub struct FrameAddr {
    pub cart: usize,
    pub frame: usize,
    pub offset: usize
}

impl fmt::Display for FrameAddr {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"cartridge {} frame {} offset {}",self.cart,self.frame,self.offset)
    }
}
