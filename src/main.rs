// Entry point for the uclcoin CLI: loads settings, opens the node on the
// configured chain store, runs one command and flushes the chain on exit.
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process;
use uclcoin::core::monetary::conversions::units_to_coins;
use uclcoin::{BlockQuery, Command, LedgerError, Node, Opt, ProofOfWork, Settings};

fn main() {
    // Info by default, RUST_LOG overrides
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load(opt.config.as_deref())?;
    if let Some(chain_file) = opt.chain_file {
        settings.chain_file = chain_file;
    }

    let node = Node::open(&settings)?;
    let result = run_command(&node, opt.command);
    node.shutdown()?;
    result
}

fn run_command(node: &Node, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Balance {
            address,
            unconfirmed,
        } => {
            let balance = if unconfirmed {
                node.get_unconfirmed_balance(&address)?
            } else {
                node.get_balance(&address)?
            };
            print_json(&json!({ "balance": units_to_coins(balance) }))?;
        }
        Command::Pending => {
            let pending = node.list_pending_transactions()?;
            print_json(&pending)?;
        }
        Command::Block { query } => match node.get_block(query)? {
            Some(block) => print_json(&block)?,
            None => {
                let BlockQuery::Index(index) = query else {
                    return Err("chain has no tip".into());
                };
                return Err(format!("Block {index} not found").into());
            }
        },
        Command::Minable { address } => {
            let minable = node.get_minable_block(&address)?;
            print_json(&minable)?;
        }
        Command::SubmitBlock { file } => {
            let raw = read_record(&file)?;
            let index = node.submit_block(&raw)?;
            print_json(&json!({ "index": index }))?;
        }
        Command::SubmitTx { file } => {
            let raw = read_record(&file)?;
            let tx_hash = node.submit_transaction(&raw)?;
            warn!("The pending pool lives in memory; {tx_hash} is dropped when this process exits");
            print_json(&json!({ "tx_hash": tx_hash }))?;
        }
        Command::Mine { address, blocks } => {
            for _ in 0..blocks {
                let minable = node.get_minable_block(&address)?;
                let difficulty = minable.difficulty;
                let mined = ProofOfWork::mine(minable.block, difficulty)
                    .ok_or("nonce space exhausted")?;
                let index = node.submit_block(&mined.to_value()?)?;
                info!("Mined block #{index} at difficulty {difficulty}: {}", mined.hash());
            }
        }
        Command::Ranking => {
            let ranking: Vec<_> = node
                .ranking()?
                .into_iter()
                .map(|(address, score)| json!({ "address": address, "score": score }))
                .collect();
            print_json(&ranking)?;
        }
        Command::Avgtimes => match node.block_time_stats()? {
            Some(stats) => print_json(&stats)?,
            None => println!("Not enough blocks yet (need 101)"),
        },
        Command::Verify => {
            node.verify()?;
            println!("Chain is valid");
        }
    }
    Ok(())
}

// Reads a JSON record from `path`, or from stdin when the path is "-".
fn read_record(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        text
    } else {
        fs::read_to_string(path)?
    };
    let value = serde_json::from_str(&text)
        .map_err(|e| LedgerError::InvalidFormat(format!("{}: {e}", path.display())))?;
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
