// test of the cartridge file system
use cartkit::fs::CartFS;
use cartkit::fs::types::{Geometry,Status};
use cartkit::bus::Opcode;
use cartkit::bus::sim::SimController;

fn pattern(len: usize,seed: usize) -> Vec<u8> {
    (0..len).map(|i| ((i + seed) % 251) as u8).collect()
}

fn powered(geometry: Geometry) -> CartFS<SimController> {
    let mut disk = cartkit::create_fs(geometry).expect("bad geometry");
    disk.power_on().expect("power on failed");
    disk
}

/// 1024 byte frames, 2 frames per cartridge, 2 cartridges
fn small() -> CartFS<SimController> {
    powered(Geometry::new(1024,2,2))
}

fn expect_err<T: std::fmt::Debug>(res: Result<T,Box<dyn std::error::Error>>,msg: &str) {
    match res {
        Ok(x) => panic!("expected `{}` but got {:?}",msg,x),
        Err(e) => assert_eq!(e.to_string(),msg)
    }
}

#[test]
fn scenario() {
    let mut disk = small();
    let dat = pattern(1500,0);
    let fd = disk.open("a").expect("open failed");
    assert_eq!(fd,0);
    assert_eq!(disk.write(fd,&dat,1500).expect("write failed"),1500);
    let stat = disk.stat(fd).expect("stat failed");
    assert_eq!(stat.frames,vec![0,1]);
    assert_eq!(stat.size,1500);
    assert_eq!(stat.position,1500);
    disk.seek(fd,1000).expect("seek failed");
    let buf = disk.read(fd,600).expect("read failed");
    assert_eq!(buf.len(),500);
    assert_eq!(buf,dat[1000..1500].to_vec());
    disk.close(fd).expect("close failed");
    assert_eq!(disk.open("a").expect("reopen failed"),0);
    let stat = disk.stat(0).expect("stat failed");
    assert_eq!((stat.position,stat.size,stat.status),(0,1500,Status::Open));
    assert_eq!(disk.read(0,1500).expect("read failed"),dat);
    // another file takes the remaining 2 physical frames
    let fb = disk.open("b").expect("open failed");
    assert_eq!(disk.write(fb,&pattern(2048,7),2048).expect("write failed"),2048);
    assert_eq!(disk.stat(fb).unwrap().frames,vec![2,3]);
    assert_eq!(disk.frames_used(),disk.capacity_frames());
    // now `a` needs a third frame that the device does not have
    disk.seek(0,1500).expect("seek failed");
    expect_err(disk.write(0,&pattern(600,3),600),"capacity exceeded");
    // the part that fit in frame 1 was written, there is no rollback
    let stat = disk.stat(0).expect("stat failed");
    assert_eq!(stat.size,2048);
    assert_eq!(stat.frames,vec![0,1]);
    disk.seek(0,1500).expect("seek failed");
    assert_eq!(disk.read(0,1000).expect("read failed"),pattern(548,3));
}

#[test]
fn round_trip_across_cartridges() {
    let mut disk = powered(Geometry::new(64,2,4));
    let fd = disk.open("long").expect("open failed");
    let dat = pattern(300,11);
    disk.write(fd,&dat,300).expect("write failed");
    assert_eq!(disk.stat(fd).unwrap().frames,vec![0,1,2,3,4]);
    disk.seek(fd,0).expect("seek failed");
    assert_eq!(disk.read(fd,300).expect("read failed"),dat);
    // arbitrary interior span
    disk.seek(fd,57).expect("seek failed");
    assert_eq!(disk.read(fd,150).expect("read failed"),dat[57..207].to_vec());
    assert_eq!(disk.stat(fd).unwrap().position,207);
    // bytes landed on the cartridges the frame numbers say
    let ctrl = disk.get_bus().controller();
    assert_eq!(ctrl.peek_frame(1,0).expect("no frame"),&dat[128..192]);
    assert_eq!(ctrl.peek_frame(2,0).expect("no frame")[0..44],dat[256..300]);
}

#[test]
fn interleaved_files() {
    let mut disk = powered(Geometry::new(32,4,4));
    let fa = disk.open("a").expect("open failed");
    let fb = disk.open("b").expect("open failed");
    let da = pattern(100,1);
    let db = pattern(100,2);
    for i in 0..4 {
        disk.write(fa,&da[i*25..(i+1)*25],25).expect("write failed");
        disk.write(fb,&db[i*25..(i+1)*25],25).expect("write failed");
    }
    // frames are handed out in global order of first touch
    assert_eq!(disk.stat(fa).unwrap().frames,vec![0,2,4,6]);
    assert_eq!(disk.stat(fb).unwrap().frames,vec![1,3,5,7]);
    disk.seek(fa,0).expect("seek failed");
    disk.seek(fb,0).expect("seek failed");
    assert_eq!(disk.read(fa,100).expect("read failed"),da);
    assert_eq!(disk.read(fb,100).expect("read failed"),db);
}

#[test]
fn partial_frame_overwrite() {
    let mut disk = small();
    let fd = disk.open("rmw").expect("open failed");
    disk.write(fd,&[0xaa;1024],1024).expect("write failed");
    disk.seek(fd,100).expect("seek failed");
    disk.write(fd,&[0x55;10],10).expect("write failed");
    let stat = disk.stat(fd).unwrap();
    assert_eq!((stat.position,stat.size),(110,1024));
    disk.seek(fd,0).expect("seek failed");
    let buf = disk.read(fd,1024).expect("read failed");
    assert_eq!(buf[0..100],[0xaau8;100]);
    assert_eq!(buf[100..110],[0x55u8;10]);
    assert_eq!(buf[110..1024],[0xaau8;914]);
}

#[test]
fn overwrite_extends_size() {
    let mut disk = small();
    let fd = disk.open("grow").expect("open failed");
    disk.write(fd,b"hello world",11).expect("write failed");
    disk.seek(fd,6).expect("seek failed");
    disk.write(fd,b"there, friend",13).expect("write failed");
    assert_eq!(disk.stat(fd).unwrap().size,19);
    disk.seek(fd,0).expect("seek failed");
    assert_eq!(disk.read(fd,100).expect("read failed"),b"hello there, friend".to_vec());
    // writing fewer bytes than supplied
    disk.seek(fd,0).expect("seek failed");
    assert_eq!(disk.write(fd,b"HELLO WORLD",5).expect("write failed"),5);
    disk.seek(fd,0).expect("seek failed");
    assert_eq!(disk.read(fd,11).expect("read failed"),b"HELLO there".to_vec());
}

#[test]
fn read_is_clipped() {
    let mut disk = small();
    let fd = disk.open("a").expect("open failed");
    disk.write(fd,&pattern(10,0),10).expect("write failed");
    // at end of file
    assert_eq!(disk.read(fd,5).expect("read failed").len(),0);
    disk.seek(fd,4).expect("seek failed");
    assert_eq!(disk.read(fd,1000).expect("read failed"),pattern(10,0)[4..].to_vec());
    assert_eq!(disk.stat(fd).unwrap().position,10);
    disk.seek(fd,0).expect("seek failed");
    assert_eq!(disk.read(fd,0).expect("read failed").len(),0);
    // empty file
    let fe = disk.open("empty").expect("open failed");
    assert_eq!(disk.read(fe,100).expect("read failed").len(),0);
}

#[test]
fn seek_does_no_io() {
    let mut disk = small();
    let fd = disk.open("a").expect("open failed");
    disk.write(fd,&pattern(2000,0),2000).expect("write failed");
    let ops = disk.get_bus().ops();
    disk.seek(fd,0).expect("seek failed");
    disk.seek(fd,2000).expect("seek failed");
    disk.seek(fd,1234).expect("seek failed");
    expect_err(disk.seek(fd,2001),"offset out of range");
    assert_eq!(disk.stat(fd).unwrap().position,1234);
    assert_eq!(disk.get_bus().ops(),ops);
    assert_eq!(disk.frames_used(),2);
}

#[test]
fn loads_only_on_cartridge_change() {
    let mut disk = small();
    assert_eq!(disk.get_bus().controller().loaded(),Some(1));
    let skip = disk.get_bus().controller().history().len();
    let fd = disk.open("a").expect("open failed");
    disk.write(fd,&pattern(1500,0),1500).expect("write failed");
    assert_eq!(disk.get_bus().controller().loaded(),Some(0));
    // power on leaves cartridge 1 loaded, the file starts on cartridge 0
    assert_eq!(disk.get_bus().controller().history()[skip..],[
        Opcode::LoadCartridge,
        Opcode::ReadFrame,
        Opcode::WriteFrame,
        Opcode::ReadFrame,
        Opcode::WriteFrame
    ]);
    let skip = disk.get_bus().controller().history().len();
    disk.seek(fd,0).expect("seek failed");
    disk.read(fd,1500).expect("read failed");
    assert_eq!(disk.get_bus().controller().history()[skip..],[Opcode::ReadFrame,Opcode::ReadFrame]);
}

#[test]
fn per_file_frame_cap() {
    let geometry = Geometry {
        max_frames: 2,
        ..Geometry::new(16,8,2)
    };
    let mut disk = powered(geometry);
    let fd = disk.open("capped").expect("open failed");
    let ops = disk.get_bus().ops();
    expect_err(disk.write(fd,&pattern(33,0),33),"capacity exceeded");
    // refused up front
    assert_eq!(disk.get_bus().ops(),ops);
    assert_eq!(disk.stat(fd).unwrap().size,0);
    assert_eq!(disk.frames_used(),0);
    assert_eq!(disk.write(fd,&pattern(32,0),32).expect("write failed"),32);
    expect_err(disk.write(fd,&[0],1),"capacity exceeded");
    disk.seek(fd,31).expect("seek failed");
    disk.write(fd,&[9],1).expect("write failed");
}

#[test]
fn file_table_capacity() {
    let geometry = Geometry {
        max_files: 3,
        ..Geometry::new(16,8,2)
    };
    let mut disk = powered(geometry);
    for name in ["a","b","c"] {
        disk.open(name).expect("open failed");
    }
    expect_err(disk.open("d"),"capacity exceeded");
    disk.close(1).expect("close failed");
    // closing does not free a slot
    expect_err(disk.open("d"),"capacity exceeded");
    assert_eq!(disk.open("b").expect("open failed"),1);
    expect_err(disk.open(""),"bad file name");
}

#[test]
fn request_errors() {
    let mut disk = small();
    let fd = disk.open("a").expect("open failed");
    expect_err(disk.read(1,10),"invalid file handle");
    expect_err(disk.read(-1,10),"invalid file handle");
    expect_err(disk.write(7,&[0],1),"invalid file handle");
    expect_err(disk.seek(1,0),"invalid file handle");
    expect_err(disk.close(1),"invalid file handle");
    expect_err(disk.read(fd,-1),"negative length");
    expect_err(disk.write(fd,&[0],-1),"negative length");
    expect_err(disk.write(fd,&[0;4],5),"count exceeds data supplied");
    disk.close(fd).expect("close failed");
    expect_err(disk.close(fd),"file is closed");
    expect_err(disk.read(fd,1),"file is closed");
    expect_err(disk.write(fd,&[0],1),"file is closed");
    expect_err(disk.seek(fd,0),"file is closed");
    // a closed file can still be inspected
    assert_eq!(disk.stat(fd).unwrap().status,Status::Closed);
}

#[test]
fn power_sequences() {
    let mut disk = cartkit::create_fs(Geometry::new(64,2,3)).expect("bad geometry");
    disk.power_on().expect("power on failed");
    let mut expected = vec![Opcode::Init];
    for _i in 0..3 {
        expected.push(Opcode::LoadCartridge);
        expected.push(Opcode::ZeroCartridge);
    }
    assert_eq!(disk.get_bus().controller().history(),&expected);
    let fd = disk.open("a").expect("open failed");
    disk.write(fd,&pattern(200,0),200).expect("write failed");
    assert_eq!(disk.frames_used(),4);
    let skip = disk.get_bus().controller().history().len();
    disk.power_off().expect("power off failed");
    let mut expected = Vec::new();
    for _i in 0..3 {
        expected.push(Opcode::LoadCartridge);
        expected.push(Opcode::ZeroCartridge);
    }
    expected.push(Opcode::PowerOff);
    assert_eq!(disk.get_bus().controller().history()[skip..],expected);
    assert_eq!(disk.frames_used(),0);
    expect_err(disk.stat(0),"invalid file handle");
    assert!(disk.get_bus().controller().to_bytes().iter().all(|b| *b==0));
    assert!(!disk.get_bus().controller().is_initialized());
    // back on, names start over
    disk.power_on().expect("power on failed");
    let fd = disk.open("b").expect("open failed");
    assert_eq!(fd,0);
    disk.write(fd,&[1;10],10).expect("write failed");
    assert_eq!(disk.stat(fd).unwrap().frames,vec![0]);
}

#[test]
fn power_on_keeps_frame_counter() {
    let mut disk = small();
    let fd = disk.open("a").expect("open failed");
    disk.write(fd,&[1;10],10).expect("write failed");
    disk.power_on().expect("power on failed");
    assert_eq!(disk.frames_used(),1);
    expect_err(disk.stat(0),"invalid file handle");
    let fd = disk.open("a").expect("open failed");
    assert_eq!(disk.stat(fd).unwrap().size,0);
    disk.write(fd,&[2;10],10).expect("write failed");
    assert_eq!(disk.stat(fd).unwrap().frames,vec![1]);
}

#[test]
fn io_before_power_on() {
    let mut disk = cartkit::create_fs(Geometry::new(64,2,2)).expect("bad geometry");
    let fd = disk.open("a").expect("open failed");
    expect_err(disk.write(fd,&[1;10],10),"bus failure");
}

#[test]
fn bus_failure_mid_write() {
    let mut disk = powered(Geometry::new(64,4,2));
    let fd = disk.open("a").expect("open failed");
    // load, then read+write of the first frame, then the read of the second frame fails
    disk.get_bus_mut().controller_mut().fail_after(3);
    expect_err(disk.write(fd,&pattern(200,0),200),"bus failure");
    let stat = disk.stat(fd).unwrap();
    assert_eq!(stat.size,64);
    assert_eq!(stat.position,64);
    assert_eq!(stat.frames,vec![0,1]);
    disk.get_bus_mut().controller_mut().heal();
    // the first frame is intact
    disk.seek(fd,0).expect("seek failed");
    assert_eq!(disk.read(fd,200).expect("read failed"),pattern(64,0));
    // a later write resumes on the frame that was already allocated
    disk.write(fd,&pattern(136,64),136).expect("write failed");
    assert_eq!(disk.stat(fd).unwrap().frames,vec![0,1,2,3]);
    disk.seek(fd,0).expect("seek failed");
    assert_eq!(disk.read(fd,200).expect("read failed"),pattern(200,0));
}

#[test]
fn bus_failure_on_read() {
    let mut disk = small();
    let fd = disk.open("a").expect("open failed");
    disk.write(fd,&pattern(1500,0),1500).expect("write failed");
    disk.seek(fd,0).expect("seek failed");
    disk.get_bus_mut().controller_mut().fail_after(1);
    expect_err(disk.read(fd,1500),"bus failure");
    // nothing returned, position unchanged
    assert_eq!(disk.stat(fd).unwrap().position,0);
    disk.get_bus_mut().controller_mut().heal();
    assert_eq!(disk.read(fd,1500).expect("read failed"),pattern(1500,0));
}

#[test]
fn bus_failure_on_power_on() {
    let mut disk = cartkit::create_fs(Geometry::new(64,2,2)).expect("bad geometry");
    disk.get_bus_mut().controller_mut().fail_after(2);
    expect_err(disk.power_on(),"bus failure");
    // stopped at the first failure
    assert_eq!(disk.get_bus().controller().history().len(),3);
}

#[test]
fn independent_devices() {
    let mut d1 = small();
    let mut d2 = small();
    let f1 = d1.open("x").expect("open failed");
    let f2 = d2.open("y").expect("open failed");
    d1.write(f1,b"first",5).expect("write failed");
    d2.write(f2,b"second",6).expect("write failed");
    assert_eq!(d1.frames_used(),1);
    assert_eq!(d2.frames_used(),1);
    d1.seek(f1,0).expect("seek failed");
    assert_eq!(d1.read(f1,10).expect("read failed"),b"first".to_vec());
}

#[test]
fn metadata() {
    let mut disk = small();
    let fd = disk.open("meta").expect("open failed");
    disk.write(fd,b"abc",3).expect("write failed");
    disk.close(fd).expect("close failed");
    let meta = json::parse(&disk.get_metadata(None)).expect("bad JSON");
    assert_eq!(meta["frames_used"],1);
    assert_eq!(meta["geometry"]["cart_size"],2);
    assert_eq!(meta["files"][0]["name"],"meta");
    assert_eq!(meta["files"][0]["size"],3);
    assert_eq!(meta["files"][0]["status"],"closed");
    assert_eq!(meta["files"][0]["frames"][0],0);
}

#[test]
fn geometry_json() {
    let geometry = Geometry::from_json("{\"frame_size\": 512, \"max_carts\": 4}").expect("parse failed");
    assert_eq!(geometry,Geometry { frame_size: 512, max_carts: 4, ..Geometry::default() });
    expect_err(Geometry::from_json("{\"frame_size\": 0}"),"bad device geometry");
    expect_err(Geometry::from_json("{\"frames\": 4}"),"bad device geometry");
    expect_err(Geometry::from_json("{\"frame_size\": -4}"),"bad device geometry");
    expect_err(Geometry::from_json("[1,2]"),"bad device geometry");
    assert!(cartkit::create_fs(Geometry::new(1024,1 << 17,1)).is_err());
    // products that do not fit a usize
    let huge = Geometry::new(1 << (usize::BITS - 8),1 << 16,1 << 16);
    expect_err(cartkit::create_fs(huge).map(|_| ()),"bad device geometry");
    let long = Geometry { max_frames: usize::MAX / 2, ..Geometry::new(16,1,1) };
    expect_err(cartkit::create_fs(long).map(|_| ()),"bad device geometry");
    expect_err(Geometry::from_json(&format!("{{\"frame_size\": {}}}",1u64 << 60)),"bad device geometry");
}
