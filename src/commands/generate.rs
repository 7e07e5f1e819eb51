//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Site;

/// Pre-render the listing and the first posts into the public dir
pub async fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    let client = site.client()?;
    let generator = Generator::new(site)?;
    let report = generator.generate(&client).await?;

    if report.has_more {
        tracing::info!("More posts are available through \"load more\"");
    }

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
