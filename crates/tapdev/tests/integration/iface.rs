//! Interface configuration integration tests.

use std::net::Ipv4Addr;

use tapdev::iface::iff;
use tapdev::{InterfaceConfig, Result, TapDevice, ifname};

use crate::common::{ip, unique_name};

#[test]
fn test_up_down() -> Result<()> {
    require_root!();

    let tap = TapDevice::open(Some(&unique_name("tdi")), true)?;
    assert!(!tap.is_up()?);

    tap.set_up()?;
    assert!(tap.is_up()?);
    assert!(tap.interface().flags()? & iff::UP != 0);

    tap.set_down()?;
    assert!(!tap.is_up()?);
    Ok(())
}

#[test]
fn test_mtu() -> Result<()> {
    require_root!();

    let tap = TapDevice::open(Some(&unique_name("tdi")), true)?;
    assert_eq!(tap.mtu()?, 1500);

    tap.set_mtu(1400)?;
    assert_eq!(tap.mtu()?, 1400);
    Ok(())
}

#[test]
fn test_ipv4_address_and_netmask() -> Result<()> {
    require_root!();

    let name = unique_name("tdi");
    let tap = TapDevice::open(Some(&name), true)?;
    assert_eq!(tap.ipv4_addr()?, None);
    assert_eq!(tap.netmask()?, None);

    let addr = Ipv4Addr::new(10, 213, 7, 1);
    tap.set_ipv4_addr(addr)?;
    tap.interface().set_prefix_len(24)?;

    assert_eq!(tap.ipv4_addr()?, Some(addr));
    assert_eq!(tap.netmask()?, Some(Ipv4Addr::new(255, 255, 255, 0)));

    let shown = ip(&["-4", "addr", "show", "dev", &name])?;
    assert!(shown.contains("10.213.7.1/24"), "ip addr output: {shown}");
    Ok(())
}

#[test]
fn test_mac_address() -> Result<()> {
    require_root!();

    let tap = TapDevice::open(Some(&unique_name("tdi")), true)?;
    let mac = [0x02, 0x00, 0x5e, 0x10, 0x20, 0x30];

    tap.set_mac_addr(mac)?;
    assert_eq!(tap.mac_addr()?, mac);
    Ok(())
}

#[test]
fn test_index_matches_sysfs() -> Result<()> {
    require_root!();

    let name = unique_name("tdi");
    let tap = TapDevice::open(Some(&name), true)?;
    assert_eq!(tap.index()?, ifname::name_to_index(&name)?);
    assert_eq!(ifname::index_to_name(tap.index()?)?, name);
    Ok(())
}

#[test]
fn test_standalone_config_targets_same_interface() -> Result<()> {
    require_root!();

    let name = unique_name("tdi");
    let tap = TapDevice::open(Some(&name), true)?;
    let cfg = InterfaceConfig::new(name.clone())?;

    cfg.set_mtu(1280)?;
    assert_eq!(tap.mtu()?, 1280);
    assert_eq!(&cfg, tap.interface());
    Ok(())
}
