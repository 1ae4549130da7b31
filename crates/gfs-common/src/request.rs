//! Forecast requests and the grib filter queries they map to.

use crate::bbox::Window;
use crate::time::ModelRun;

/// One forecast hour of one model run over a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRequest {
    pub run: ModelRun,
    pub forecast_hour: u32,
    pub window: Window,
}

impl ForecastRequest {
    /// Build a request, snapping `forecast_hour` onto the model's table.
    pub fn new(run: ModelRun, forecast_hour: u32, window: Window) -> Self {
        Self {
            run,
            forecast_hour: run.model.nearest_offset(forecast_hour),
            window,
        }
    }

    /// Minimal-footprint request used to test availability.
    pub fn probe(run: ModelRun, forecast_hour: u32) -> Self {
        Self::new(run, forecast_hour, Window::probe())
    }

    /// Upstream file name selected by this request.
    pub fn file_name(&self) -> String {
        self.run.model.file_name(&self.run.cycle(), self.forecast_hour)
    }

    /// Filter query for the given variables and levels.
    pub fn filter_query(&self, url_template: &str, params: &[String], levels: &[u32]) -> FilterQuery {
        let fb = self.window.filter_box();

        let mut query = vec![
            ("file".to_string(), self.file_name()),
            ("dir".to_string(), self.run.directory()),
            ("subregion".to_string(), String::new()),
            ("leftlon".to_string(), fb.left_lon.to_string()),
            ("rightlon".to_string(), fb.right_lon.to_string()),
            ("toplat".to_string(), fb.top_lat.to_string()),
            ("bottomlat".to_string(), fb.bottom_lat.to_string()),
        ];
        query.extend(params.iter().map(|p| (format!("var_{}", p), "on".to_string())));
        query.extend(levels.iter().map(|l| (format!("lev_{}_mb", l), "on".to_string())));

        FilterQuery {
            url: self.run.model.filter_url(url_template),
            params: query,
        }
    }
}

/// A GET against the grib filter: script URL plus ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl FilterQuery {
    /// Value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
