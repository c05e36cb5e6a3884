use crate::output::print_json;
use red64_core::classifier::Classifier;
use red64_core::detector;

pub fn run(prompt: &str, json: bool) -> anyhow::Result<()> {
    let task_type = Classifier::default().classify(prompt);
    let file_types = detector::detect_file_signals(prompt);

    if json {
        let value = serde_json::json!({
            "task_type": task_type,
            "file_types": file_types,
        });
        print_json(&value)?;
        return Ok(());
    }

    println!("Task type:  {task_type}");
    if file_types.is_empty() {
        println!("File types: (none)");
    } else {
        println!("File types: {}", file_types.join(", "));
    }
    Ok(())
}
