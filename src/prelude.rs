pub use crate::crm::CrmExt as _at32_hal_crm_CrmExt;
pub use crate::dma::CircReadDma as _at32_hal_dma_CircReadDma;
pub use crate::dma::DmaExt as _at32_hal_dma_DmaExt;
pub use crate::dma::ReadDma as _at32_hal_dma_ReadDma;
pub use crate::flash::FlashExt as _at32_hal_flash_FlashExt;
pub use crate::hal::adc::OneShot as _embedded_hal_adc_OneShot;
pub use crate::hal::prelude::*;
pub use crate::scfg::ScfgExt as _at32_hal_scfg_ScfgExt;
pub use crate::time::U32Ext as _at32_hal_time_U32Ext;
