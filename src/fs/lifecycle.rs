//! Power on and power off.
//!
//! Both sequences stop at the first bus failure and leave whatever state they reached.
//! After a failed power on the file system should not be used.

use log::info;
use super::CartFS;
use crate::bus::Controller;
use crate::STDRESULT;

impl <C: Controller> CartFS<C> {
    fn zero_all(&mut self) -> STDRESULT {
        for cart in 0..self.geometry.max_carts {
            self.drive.zero_cartridge(cart)?;
        }
        Ok(())
    }
    /// Initialize the device, zero every cartridge, and empty the file table.
    /// The frame counter is left alone; only `power_off` rewinds it.
    pub fn power_on(&mut self) -> STDRESULT {
        info!("power on: {}",self.geometry);
        self.drive.loaded = None;
        if let Err(e) = self.drive.bus.init() {
            return Err(self.drive.fail(e));
        }
        self.zero_all()?;
        self.table.reset();
        Ok(())
    }
    /// Zero every cartridge, power the device off, empty the file table,
    /// and rewind the frame counter.
    pub fn power_off(&mut self) -> STDRESULT {
        info!("power off after {} frames",self.alloc.used());
        self.zero_all()?;
        if let Err(e) = self.drive.bus.power_off() {
            return Err(self.drive.fail(e));
        }
        self.drive.loaded = None;
        self.table.reset();
        self.alloc.reset();
        Ok(())
    }
}
