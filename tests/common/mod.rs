use rand::Rng;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 7] = ["op", "caller", "loan", "value", "rate", "duration", "at"];

/// Writes `loans` request/fund/repay cycles, each repaid in full.
pub fn generate_csv(path: &Path, loans: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(HEADER)?;

    for id in 1..=loans {
        let id = id.to_string();
        wtr.write_record(["request", "borrower", "", "1.0", "10", "3600", "1000"])?;
        wtr.write_record(["fund", "lender", &id, "1.0", "", "", ""])?;
        wtr.write_record(["repay", "borrower", &id, "1.1", "", "", ""])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes random loan lifecycles across 50 borrowers and 10 lenders until the
/// file reaches `size_mb`. Every funded loan is either repaid or claimed.
pub fn generate_large_csv(path: &Path, size_mb: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(HEADER)?;

    let mut rng = rand::thread_rng();
    let target_size = (size_mb * 1024 * 1024) as u64;
    let mut loan_id: u64 = 1;

    // Check size every 1000 loans to avoid syscall overhead
    loop {
        for _ in 0..1000 {
            let borrower = format!("borrower-{}", rng.gen_range(1..=50));
            let lender = format!("lender-{}", rng.gen_range(1..=10));
            let rate: u32 = rng.gen_range(0..=30);
            let id = loan_id.to_string();

            wtr.write_record(["request", &borrower, "", "100", &rate.to_string(), "0", ""])?;
            wtr.write_record(["fund", &lender, &id, "100", "", "", ""])?;
            if rng.gen_bool(0.5) {
                let owed = (100 + rate).to_string();
                wtr.write_record(["repay", &borrower, &id, &owed, "", "", ""])?;
            } else {
                wtr.write_record(["claim", &lender, &id, "", "", "", ""])?;
            }
            loan_id += 1;
        }
        wtr.flush()?; // Flush to ensure file size is updated
        if std::fs::metadata(path)?.len() >= target_size {
            break;
        }
    }
    Ok(())
}
