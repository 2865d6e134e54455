use hvac_forecast::input::ForecastInput;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(ForecastInput);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
