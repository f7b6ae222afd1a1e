//! Generates a periodic field of isolated flowers from a tiny exemplar and
//! prints it as text. Pass a seed as the first argument to vary the output.

use collapse::prelude::*;
use std::error::Error;

const OUT: usize = 24;

fn main() -> Result<(), Box<dyn Error>> {
  tracing_subscriber::fmt().compact().init();

  let args = std::env::args().collect::<Vec<_>>();
  let seed: u32 = args.get(1).map(|arg| arg.parse()).transpose()?.unwrap_or(42);

  let black = Color::new(0, 0, 0);
  let red = Color::new(255, 0, 0);
  let mut input = vec![black; 16];
  input[5] = red; // (1, 1)

  let output = run_overlapping(OverlappingArgs {
    seed,
    out_width: OUT,
    out_height: OUT,
    periodic_output: true,
    periodic_input: true,
    pattern_size: 3,
    ground: false,
    symmetry: 8,
    nb_samples: 1,
    nb_tries: 20,
    input,
    input_width: 4,
    input_height: 4,
    verbose: true,
  })?;

  if output.is_empty() {
    eprintln!("every try contradicted, try another seed");
    return Ok(());
  }

  for row in output.chunks(OUT) {
    let line = row
      .iter()
      .map(|&pixel| if pixel == red { '*' } else { '.' })
      .collect::<String>();
    println!("{line}");
  }

  Ok(())
}
