//! Writes `sample_data.json`: sheets of noisy sigmoid curves on irregular
//! x grids, with known inflection points, ready for `rusty-deriv derive`.

use anyhow::{Context, Result};
use rusty_deriv::TableWriter;

fn sigmoid(x: f64, centre: f64, width: f64, amplitude: f64) -> f64 {
    amplitude / (1.0 + (-(x - centre) / width).exp())
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let mut rng = SimpleRng::new(42);

    // (sheet, [(series, centre, width, amplitude)])
    let sheets = [
        ("run_A", vec![("low", 35.0, 3.0, 1.0), ("high", 42.0, 4.0, 2.5)]),
        ("run_B", vec![("fast", 50.0, 2.0, 1.5), ("slow", 55.0, 6.0, 1.2)]),
    ];

    let mut writer = TableWriter::new();
    for (sheet, curves) in &sheets {
        // Irregular x: 0 → ~100 with jittered steps.
        let mut x = Vec::with_capacity(300);
        let mut t = 0.0;
        for _ in 0..300 {
            x.push(t);
            t += 0.25 + 0.2 * rng.next_f64();
        }
        writer.paste(sheet, "x", x.clone());

        for &(name, centre, width, amplitude) in curves {
            let y: Vec<f64> = x
                .iter()
                .map(|&xi| sigmoid(xi, centre, width, amplitude) + rng.gauss(0.0, 0.005 * amplitude))
                .collect();
            writer.paste(sheet, name, y);
            println!("{sheet}/{name}: inflection at x = {centre}");
        }
    }

    let output_path = "sample_data.json";
    writer
        .save(output_path)
        .with_context(|| format!("writing {output_path}"))?;
    println!("Wrote {} sheets to {output_path}", sheets.len());
    Ok(())
}
