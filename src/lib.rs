//! # `cartkit` main library
//!
//! This library presents byte addressable files on top of a cartridge storage device.
//! The device holds a fixed number of removable cartridges, each holding a fixed number of
//! equally sized frames.  Only whole frames can be transferred, and only frames of the
//! loaded cartridge can be reached.
//!
//! ## Architecture
//!
//! Operations are layered as follows:
//! * `bus::Controller` executes one request against the device, this is the hardware seam
//! * `bus::BusAdapter` issues typed requests and maps the return bit to an error
//! * `fs::CartFS` is the device context: file table, frame allocation, offset translation,
//!   and the read and write paths
//!
//! A `CartFS` takes ownership of a controller.  The `bus::sim` module supplies an in-memory
//! controller, which is what `create_fs` hooks up.
//!
//! ## Files
//!
//! Files live in a flat namespace.  Opening a new name creates an empty file, opening a
//! known name rewinds it.  Files can be closed and reopened but never deleted; the whole
//! table is cleared when the device is powered on or off.
//!
//! Physical frames are never reclaimed while the device is on.  Every frame a file ever
//! needed stays assigned to it, and the device fills up monotonically.

pub mod bus;
pub mod fs;
pub mod commands;

use log::info;
use fs::CartFS;
use fs::types::Geometry;
use bus::sim::SimController;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Create a file system on a fresh simulated device with the given geometry.
/// The device still has to be powered on.
pub fn create_fs(geometry: Geometry) -> Result<CartFS<SimController>,DYNERR> {
    geometry.verify()?;
    let ctrl = SimController::new(&geometry);
    CartFS::new(ctrl,geometry)
}

/// Read a geometry from a JSON file, see `Geometry::from_json`
pub fn geometry_from_file(path: &str) -> Result<Geometry,DYNERR> {
    let json_str = std::fs::read_to_string(path)?;
    let ans = Geometry::from_json(&json_str)?;
    info!("geometry from {}: {}",path,ans);
    Ok(ans)
}
