use crate::dedup::ContentHashes;
use crate::error::Result;

pub fn run(line: &str) -> Result<()> {
    let hashes = ContentHashes::of(line);
    println!("{}", hashes.primary);
    println!("{}  (with trailing CR)", hashes.alt_ending);
    Ok(())
}
