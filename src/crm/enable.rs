use super::*;
use crate::pac::crm;

macro_rules! bus {
    ($($PER:ident => ($Bus:ident, $field:path),)+) => {
        $(
            impl crate::Sealed for crate::pac::$PER {}
            impl CrmBus for crate::pac::$PER {
                type Bus = $Bus;
            }
            impl Enable for crate::pac::$PER {
                #[inline(always)]
                fn enable(bus: &mut $Bus) {
                    bus.enr().modify(|w| $field.insert(w, 1));
                    // Stall the pipeline until the peripheral clock is live
                    cortex_m::asm::dsb();
                }
                #[inline(always)]
                fn disable(bus: &mut $Bus) {
                    bus.enr().modify(|w| $field.insert(w, 0));
                }
            }
            impl Reset for crate::pac::$PER {
                #[inline(always)]
                fn reset(bus: &mut $Bus) {
                    bus.rstr().modify(|w| $field.insert(w, 1));
                    bus.rstr().modify(|w| $field.insert(w, 0));
                }
            }
        )+
    }
}

bus! {
    SCFG => (APB2, crm::apb2::SCFGEN),
    ADC1 => (APB2, crm::apb2::ADC1EN),
}

// DMA1 has no reset line, only the AHB clock gate
impl crate::Sealed for crate::pac::DMA1 {}
impl CrmBus for crate::pac::DMA1 {
    type Bus = AHB;
}
impl Enable for crate::pac::DMA1 {
    #[inline(always)]
    fn enable(bus: &mut AHB) {
        bus.enr().modify(|w| crm::ahben::DMA1EN.insert(w, 1));
        cortex_m::asm::dsb();
    }
    #[inline(always)]
    fn disable(bus: &mut AHB) {
        bus.enr().modify(|w| crm::ahben::DMA1EN.insert(w, 0));
    }
}
