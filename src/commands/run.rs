//! Run a workload script against a simulated device.
//!
//! The device is powered on before the first line and powered off after the last.
//! Each line is one operation; blank lines and lines starting with `#` are skipped.
//! Files are referred to by name, the runner keeps track of the handles.
//!
//! ```text
//! open NAME
//! close NAME
//! seek NAME OFFSET
//! read NAME COUNT
//! write NAME TEXT...
//! writex NAME HEX
//! fill NAME COUNT BYTE
//! poweron
//! poweroff
//! ```

use clap;
use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;
use log::{info,error};
use super::{CommandError,Verb};
use crate::bus::sim::SimController;
use crate::fs::CartFS;
use crate::fs::types::{Geometry,Handle};
use crate::{STDRESULT,DYNERR};

const RCH: &str = "unreachable was reached";

/// Start from the JSON file if given, then apply explicit flags
fn geometry_from_args(cmd: &clap::ArgMatches) -> Result<Geometry,DYNERR> {
    let mut ans = match cmd.get_one::<String>("geometry") {
        Some(path) => crate::geometry_from_file(path)?,
        None => Geometry::default()
    };
    let flags: [(&str,&mut usize);5] = [
        ("frame-size",&mut ans.frame_size),
        ("cart-size",&mut ans.cart_size),
        ("carts",&mut ans.max_carts),
        ("max-files",&mut ans.max_files),
        ("max-frames",&mut ans.max_frames)
    ];
    for (key,field) in flags {
        if let Some(val) = cmd.get_one::<usize>(key) {
            *field = *val;
        }
    }
    ans.verify()?;
    Ok(ans)
}

fn parse_byte(s: &str) -> Result<u8,DYNERR> {
    let ans = match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex,16),
        None => u8::from_str(s)
    };
    match ans {
        Ok(b) => Ok(b),
        Err(_) => Err(Box::new(CommandError::OutOfRange))
    }
}

fn word<'a>(words: &[&'a str],i: usize) -> Result<&'a str,DYNERR> {
    match words.get(i) {
        Some(s) => Ok(*s),
        None => Err(Box::new(CommandError::MissingArgument))
    }
}

/// Text after the first `skip` words, with one separator removed and inner spacing kept
fn tail(line: &str,skip: usize) -> &str {
    let mut rest = line;
    for _i in 0..skip {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = &rest[end..];
    }
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => chars.as_str(),
        _ => rest
    }
}

/// Executes workload lines, keeping the name to handle map
pub struct Runner {
    disk: CartFS<SimController>,
    handles: HashMap<String,Handle>,
    powered: bool
}

impl Runner {
    pub fn new(disk: CartFS<SimController>) -> Self {
        Self {
            disk,
            handles: HashMap::new(),
            powered: false
        }
    }
    pub fn is_powered(&self) -> bool {
        self.powered
    }
    pub fn power_on(&mut self) -> STDRESULT {
        self.handles.clear();
        self.disk.power_on()?;
        self.powered = true;
        Ok(())
    }
    pub fn power_off(&mut self) -> STDRESULT {
        self.handles.clear();
        self.disk.power_off()?;
        self.powered = false;
        Ok(())
    }
    pub fn get_disk(&self) -> &CartFS<SimController> {
        &self.disk
    }
    pub fn get_disk_mut(&mut self) -> &mut CartFS<SimController> {
        &mut self.disk
    }
    fn handle(&self,name: &str) -> Result<Handle,DYNERR> {
        match self.handles.get(name) {
            Some(h) => Ok(*h),
            None => Err(Box::new(CommandError::UnknownFile))
        }
    }
    /// Execute one line, returning the text to report, or None for a line with nothing to do
    pub fn execute(&mut self,line: &str) -> Result<Option<String>,DYNERR> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let verb = Verb::from_str(words[0])?;
        match verb {
            Verb::PowerOn => {
                self.power_on()?;
                return Ok(Some(format!("{} -> ok",line)));
            },
            Verb::PowerOff => {
                self.power_off()?;
                return Ok(Some(format!("{} -> ok",line)));
            },
            _ => {}
        }
        let name = word(&words,1)?;
        if verb==Verb::Open {
            let fd = self.disk.open(name)?;
            self.handles.insert(name.to_string(),fd);
            return Ok(Some(format!("{} -> {}",line,fd)));
        }
        let fd = self.handle(name)?;
        let report = match verb {
            Verb::Close => {
                self.disk.close(fd)?;
                "ok".to_string()
            },
            Verb::Seek => {
                let offset = usize::from_str(word(&words,2)?)?;
                self.disk.seek(fd,offset)?;
                "ok".to_string()
            },
            Verb::Read => {
                let count = i32::from_str(word(&words,2)?)?;
                let dat = self.disk.read(fd,count)?;
                format!("{} {}",dat.len(),hex::encode(&dat))
            },
            Verb::Write => {
                let dat = tail(line,2).as_bytes();
                self.disk.write(fd,dat,dat.len() as i32)?.to_string()
            },
            Verb::WriteHex => {
                let dat = hex::decode(word(&words,2)?)?;
                self.disk.write(fd,&dat,dat.len() as i32)?.to_string()
            },
            Verb::Fill => {
                let count = i32::from_str(word(&words,2)?)?;
                let byte = parse_byte(word(&words,3)?)?;
                let dat = vec![byte;usize::try_from(count).unwrap_or(0)];
                self.disk.write(fd,&dat,count)?.to_string()
            },
            _ => panic!("{}",RCH)
        };
        Ok(Some(format!("{} -> {}",line,report)))
    }
}

pub fn run(cmd: &clap::ArgMatches) -> STDRESULT {
    let geometry = geometry_from_args(cmd)?;
    let script = match cmd.get_one::<String>("workload") {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            if atty::is(atty::Stream::Stdin) {
                error!("cannot use `run` with console input, please pipe a workload in or use `-w`");
                return Err(Box::new(CommandError::InvalidCommand));
            }
            let mut ans = String::new();
            std::io::stdin().read_to_string(&mut ans)?;
            ans
        }
    };
    let mut runner = Runner::new(crate::create_fs(geometry)?);
    runner.power_on()?;
    for (i,line) in script.lines().enumerate() {
        match runner.execute(line) {
            Ok(Some(report)) => println!("{}",report),
            Ok(None) => {},
            Err(e) => {
                eprintln!("line {}: {}",i+1,e);
                return Err(e);
            }
        }
    }
    if cmd.get_flag("stat") {
        let indent = cmd.get_one::<u16>("indent").copied();
        println!("{}",runner.get_disk().get_metadata(indent));
    }
    if let Some(path) = cmd.get_one::<String>("dump") {
        let img = runner.get_disk().get_bus().controller().to_bytes();
        info!("writing {} bytes to {}",img.len(),path);
        std::fs::write(path,img)?;
    }
    if runner.is_powered() {
        runner.power_off()?;
    }
    Ok(())
}
