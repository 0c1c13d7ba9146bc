//! `DataSource` backed by a netCDF file.

use crate::error::{CheckError, Result};
use crate::source::{CharArray, DataSource, NumericArray};

/// Default fill for numeric variables without a `_FillValue` attribute.
const DEFAULT_FILL: f64 = 99999.0;

pub struct NcSource {
    nch: netcdf::File,
}

impl NcSource {
    pub fn open(nc_file: &str) -> Result<Self> {
        match netcdf::open(nc_file) {
            Ok(nch) => Ok(NcSource { nch }),
            Err(err) => Err(CheckError::Open {
                path: nc_file.to_owned(),
                msg: err.to_string(),
            }),
        }
    }

    fn get_var(&self, varname: &str) -> Result<netcdf::Variable<'_>> {
        match self.nch.variable(varname) {
            Some(v) => Ok(v),
            None => Err(CheckError::VariableMissing(varname.to_owned())),
        }
    }
}

fn attr_as_f64(value: netcdf::AttrValue) -> Option<f64> {
    match value {
        netcdf::AttrValue::Double(v) => Some(v),
        netcdf::AttrValue::Float(v) => Some(v as f64),
        netcdf::AttrValue::Int(v) => Some(v as f64),
        netcdf::AttrValue::Short(v) => Some(v as f64),
        netcdf::AttrValue::Longlong(v) => Some(v as f64),
        netcdf::AttrValue::Schar(v) => Some(v as f64),
        netcdf::AttrValue::Uchar(v) => Some(v as f64),
        _ => None,
    }
}

impl DataSource for NcSource {
    fn dimension_length(&self, name: &str) -> Option<usize> {
        self.nch.dimension(name).map(|d| d.len())
    }

    fn has_variable(&self, name: &str) -> bool {
        self.nch.variable(name).is_some()
    }

    fn variable_names(&self) -> Vec<String> {
        self.nch.variables().map(|v| v.name()).collect()
    }

    fn read_numeric(&self, name: &str) -> Result<NumericArray> {
        let var = self.get_var(name)?;
        let data = match var.values::<f64>(None, None) {
            Ok(arr) => arr,
            Err(err) => {
                return Err(CheckError::Read {
                    var: name.to_owned(),
                    msg: err.to_string(),
                })
            }
        };

        let fill = var
            .attribute("_FillValue")
            .and_then(|attr| attr.value().ok())
            .and_then(attr_as_f64)
            .unwrap_or(DEFAULT_FILL);

        Ok(NumericArray {
            shape: data.shape().to_vec(),
            values: data.iter().copied().collect(),
            fill,
        })
    }

    /// NC_CHAR variables are read as raw bytes: the typed getters would ask
    /// netCDF to convert text to numbers, which it refuses.
    fn read_chars(&self, name: &str) -> Result<CharArray> {
        let var = self.get_var(name)?;
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let start = vec![0; shape.len()];
        let mut values = vec![b' '; var.len()];
        match var.raw_values(&mut values, &start, &shape) {
            Ok(()) => Ok(CharArray { shape, values }),
            Err(err) => Err(CheckError::Read {
                var: name.to_owned(),
                msg: err.to_string(),
            }),
        }
    }
}
