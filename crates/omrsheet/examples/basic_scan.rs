use omrsheet::{load_image, Scanner, SheetLayout, SheetSpec};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "Usage: {} <image.png> <items> <choices> [out.json]",
            args[0]
        );
        std::process::exit(2);
    }

    let image = load_image(Path::new(&args[1]))?;
    let sheet = SheetSpec::new(args[2].parse()?, args[3].parse()?);

    let scanner = Scanner::new(SheetLayout::default());
    let result = scanner.scan(&image, &sheet)?;

    let ambiguous = result.ambiguous_items();
    println!(
        "Read {} items ({} answered, {} ambiguous), orientation {:?}.",
        result.items.len(),
        result.responses().len(),
        ambiguous.len(),
        result.orientation
    );
    for (item, choice) in result.answers() {
        match choice {
            Some(choice) => println!("  {item:>3}: {choice}"),
            None => println!("  {item:>3}: -"),
        }
    }

    if let Some(out_path) = args.get(4) {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
