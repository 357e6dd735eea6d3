mod commands;
mod terminal;

use commands::{CommandLine, listen};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands: CommandLine = CommandLine::parse_args();

    logging::init(commands.verbose)?;
    print::banner();

    listen::listen(&commands).await
}
