use clap::{value_parser, crate_version, Arg, ArgAction, Command, ValueHint};

const WORKLOAD_LONG_HELP: &str = "One operation per line, blank lines and `#` comments are skipped.
  open NAME              open or create a file
  close NAME             close a file
  seek NAME OFFSET       move the position of a file
  read NAME COUNT        read bytes, printed as hex
  write NAME TEXT...     write the text
  writex NAME HEX        write the hex bytes
  fill NAME COUNT BYTE   write COUNT copies of BYTE (decimal or 0x hex)
  poweron                power the device on (done before the first line)
  poweroff               power the device off (done after the last line)";
const GEOMETRY_LONG_HELP: &str = "JSON object with any of the keys
frame_size, cart_size, max_carts, max_files, max_frames, max_path.
Missing keys take their defaults, explicit flags override the file.";

fn size_arg(name: &'static str,help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
        .value_name("COUNT")
        .value_parser(value_parser!(usize))
        .required(false)
}

fn indent_arg() -> Arg {
    Arg::new("indent").long("indent").help("JSON indentation, omit to minify")
        .value_name("SPACES")
        .value_parser(value_parser!(u16).range(0..16))
        .required(false)
}

pub fn build_cli() -> Command {
    let long_help = "cartkit is always invoked with exactly one of several subcommands.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
run a workload:        `cartkit run -w workload.txt`
small device:          `cartkit run -w workload.txt --frame-size 1024 --cart-size 2 --carts 2`
piped workload:        `echo \"open a\" | cartkit run`
inspect file table:    `cartkit run -w workload.txt --stat --indent 2`";

    let mut main_cmd = Command::new("cartkit")
        .about("Byte addressable files on a cartridge storage device.")
        .after_long_help(long_help)
        .version(crate_version!());

    main_cmd = main_cmd.subcommand(
        Command::new("run")
            .arg(
                Arg::new("workload").short('w').long("workload").help("path to workload script, omit to read stdin")
                    .value_name("PATH")
                    .value_hint(ValueHint::FilePath)
                    .required(false)
                    .long_help(WORKLOAD_LONG_HELP)
            )
            .arg(
                Arg::new("geometry").short('g').long("geometry").help("path to JSON device geometry")
                    .value_name("PATH")
                    .value_hint(ValueHint::FilePath)
                    .required(false)
                    .long_help(GEOMETRY_LONG_HELP)
            )
            .arg(size_arg("frame-size","bytes per frame"))
            .arg(size_arg("cart-size","frames per cartridge"))
            .arg(size_arg("carts","cartridges on the device"))
            .arg(size_arg("max-files","entries in the file table"))
            .arg(size_arg("max-frames","frames per file"))
            .arg(
                Arg::new("dump").short('d').long("dump").help("write raw device image before power off")
                    .value_name("PATH")
                    .value_hint(ValueHint::FilePath)
                    .required(false)
            )
            .arg(Arg::new("stat").long("stat").help("print file table as JSON before power off").action(ArgAction::SetTrue))
            .arg(indent_arg())
            .about("power on a simulated device, run a workload, power off")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("completions")
            .arg(
                Arg::new("shell").short('s').long("shell").help("shell target").value_name("NAME")
                    .required(true)
                    .value_parser(["bash","elv","fish","ps1","zsh"])
            )
            .about("write completions script to stdout for the specified shell")
    );
    return main_cmd;
}
