use fieldcanon::{CallableRef, Canonicalizer, SecretsMasker, TemplateValue};
use serde_json::json;

fn main() {
    let canonicalizer = Canonicalizer::new(120).with_redactor(SecretsMasker::new());
    let fields = vec![
        (
            "params",
            TemplateValue::from(json!({"retries": 3, "owner": "data-eng"})),
        ),
        (
            "python_callable",
            TemplateValue::object(CallableRef::new("dags.etl", "transform")),
        ),
        ("bash_command", TemplateValue::from("echo ".repeat(40))),
    ];

    for (name, value) in fields {
        let field = canonicalizer.canonicalize(value, name);
        match serde_json::to_string(&field) {
            Ok(text) => println!("{}: {}", name, text),
            Err(err) => {
                eprintln!("serialization failed: {}", err);
                std::process::exit(1);
            }
        }
    }
}
