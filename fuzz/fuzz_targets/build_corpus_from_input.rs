#![no_main]

use hvac_forecast::corpus::Corpus;
use hvac_forecast::input::ForecastInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: ForecastInput| {
    if let Some(corpus) = Corpus::from_inputs(&input) {
        let results = corpus.run();
        assert!(!results.total_hvac_cost().is_nan());
        assert!(!results.balance_point.balance_point_temp_f.is_nan());
    }
});
