use clap::Parser;

use bitarray_rs::terms::{Basis, TermSearch};
use bitarray_rs::{BitOrder, BitVector, Op};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of basis vectors.
    #[arg(value_name = "INT", default_value = "64")]
    basis: usize,

    /// Length of each basis vector, in bits.
    #[clap(long, value_name = "INT", default_value = "10000")]
    bits: usize,

    /// Term degree.
    #[clap(long, value_name = "INT", default_value = "2")]
    degree: usize,

    /// Operator combining the vectors of a term (and, or, xor).
    #[clap(long, value_name = "OP", default_value = "and")]
    op: Op,

    /// Number of terms to keep.
    #[clap(long, value_name = "INT", default_value = "10")]
    top: usize,

    /// Expected weight; terms are ranked by their distance from it.
    #[clap(long, value_name = "INT")]
    center: Option<u64>,

    /// Probability of a set bit in the random basis.
    #[clap(long, value_name = "FLOAT", default_value = "0.5")]
    density: f64,

    /// Random seed.
    #[clap(long, value_name = "INT", default_value = "42")]
    seed: u64,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    if !(0.0..=1.0).contains(&args.density) {
        color_eyre::eyre::bail!("density must lie in [0, 1], got {}", args.density);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let vectors: Vec<BitVector> = (0..args.basis)
        .map(|_| {
            (0..args.bits)
                .map(|_| rng.random_bool(args.density))
                .collect::<Vec<bool>>()
        })
        .map(|bools| BitVector::from_bools(&bools, BitOrder::Little))
        .collect();
    let basis = Basis::new(&vectors)?;

    // Expected term weight when all bits are independent.
    let center = args.center.unwrap_or_else(|| {
        let p = args.density;
        let q = match args.op {
            Op::And => p.powi(args.degree as i32),
            Op::Or => 1.0 - (1.0 - p).powi(args.degree as i32),
            Op::Xor => (1.0 - (1.0 - 2.0 * p).powi(args.degree as i32)) / 2.0,
        };
        (q * args.bits as f64).round() as u64
    });
    println!("center = {}", center);

    let search = TermSearch::default()
        .with_degree(args.degree)
        .with_op(args.op)
        .with_top_k(args.top)
        .with_weight_center(center);

    let time_search = std::time::Instant::now();
    let top = search.run(&basis)?;
    println!("Search done in {:.3} s", time_search.elapsed().as_secs_f64());

    for score in &top {
        let indices = score.indices(basis.len(), args.degree)?;
        let term: Vec<String> = indices.iter().map(|i| format!("x{}", i)).collect();
        println!(
            "{:>8}  weight = {:>8}  deviation = {:>8}  {}",
            score.index,
            score.weight,
            score.deviation,
            term.join(&format!(" {} ", args.op))
        );
    }

    println!("\nAll done in {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
