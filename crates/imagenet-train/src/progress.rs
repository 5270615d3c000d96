use indicatif::{ProgressBar, ProgressStyle};

const BATCH_TEMPLATE: &str =
    "{msg}: {percent:>3}%|{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}, {per_sec}]";
const IMAGE_TEMPLATE: &str =
    "{prefix}: {percent:>3}%|{wide_bar}| {human_pos}/{human_len} images [{elapsed_precise}<{eta_precise}] {msg}";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Bar counting batches, e.g. for the dataloader throughput probe.
pub fn batch_bar(total_batches: usize, description: &str) -> ProgressBar {
    ProgressBar::new(total_batches as u64)
        .with_style(style(BATCH_TEMPLATE))
        .with_message(description.to_string())
}

/// Bar counting images for a training epoch; the message holds the running metrics.
pub fn image_bar(total_images: usize, description: String) -> ProgressBar {
    ProgressBar::new(total_images as u64)
        .with_style(style(IMAGE_TEMPLATE))
        .with_prefix(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_valid() {
        assert!(ProgressStyle::with_template(BATCH_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(IMAGE_TEMPLATE).is_ok());
    }

    #[test]
    fn bars_are_sized_by_their_unit() {
        assert_eq!(batch_bar(30, "probe").length(), Some(30));
        assert_eq!(image_bar(1280, "Train epoch 0".into()).length(), Some(1280));
    }
}
